use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Request, Response};
use tracing::debug;

/// Logs one line per handled request. Only attached in debug mode.
pub struct RequestTrace;

#[rocket::async_trait]
impl Fairing for RequestTrace {
    fn info(&self) -> Info {
        Info {
            name: "Request trace",
            kind: Kind::Response
        }
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let client = req
            .client_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".into());

        debug!(
            method = %req.method(),
            path = %req.uri().path(),
            status = res.status().code,
            client = %client,
            "request"
        );
    }
}
