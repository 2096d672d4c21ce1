use crate::api::Gateway;
use crate::commands::Response;
use crate::dashboard::{self, SummaryOptions};

/// Builds the dashboard summary: totals, recent transactions and progress lines.
pub async fn summary(gateway: &mut (dyn Gateway + Send), options: SummaryOptions) -> Response {
    match dashboard::summarize(gateway, options).await {
        Ok(summary) => Response::success(200, &summary),
        Err(e) => e.into(),
    }
}
