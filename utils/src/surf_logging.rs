use std::time::Instant;
use surf::middleware::{Middleware, Next};
use surf::{Client, Request, Response};

/// Surf middleware that logs every outgoing request with its status and latency.
#[derive(Debug, Default, Clone, Copy)]
pub struct SurfLogging;

#[surf::utils::async_trait]
impl Middleware for SurfLogging {
    async fn handle(&self, req: Request, client: Client, next: Next<'_>) -> surf::Result<Response> {
        let method = req.method();
        let url = req.url().clone();
        log::debug!("Sending {} {}", method, url);

        let start = Instant::now();
        match next.run(req, client).await {
            Ok(res) => {
                log::debug!(
                    "{} {} -> {} in {:?}",
                    method,
                    url,
                    res.status(),
                    start.elapsed()
                );
                Ok(res)
            }
            Err(err) => {
                log::warn!("{} {} failed after {:?}: {}", method, url, start.elapsed(), err);
                Err(err)
            }
        }
    }
}
