// Sheet API: layout, preview, export, upload.
// Layout runs inline (fast, pure); PDF export runs inside spawn_blocking.

pub mod handlers;
pub mod upload;
