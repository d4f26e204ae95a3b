pub mod video_download;
pub mod video_get;
pub mod video_upload;
