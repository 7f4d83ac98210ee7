/// Reasons a host exchange could not be turned into a record.
///
/// Capture is best-effort: these never leave [`crate::TrafficRecorder::record`],
/// they are logged and counted instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CaptureError {
    #[error("exchange for {url} has no response")]
    MissingResponse { url: String },

    #[error("exchange for {url} has no host")]
    MissingHost { url: String },

    #[error("exchange for {url} has no request method")]
    MissingMethod { url: String },
}
