//! Request handlers. Thin glue: validation and response shaping only, all
//! policy lives in `mediad-core`.

mod artifact;
mod status;
mod submit;

pub use artifact::artifact;
pub use status::status;
pub use submit::submit;

pub async fn health() -> &'static str {
    "ok"
}
