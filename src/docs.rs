use crate::modules::thumbnails::dto::{CreateThumbnailsJobRequest, JobInfoResponse};
use crate::modules::thumbnails::model::{
    CueFileInfo, CueMeta, JobStatus, SpriteInfo, ThumbnailsResult,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::thumbnails::handler::create_thumbnails_job,
        crate::modules::thumbnails::handler::get_job,
    ),
    components(
        schemas(
            CreateThumbnailsJobRequest, JobInfoResponse, JobStatus,
            ThumbnailsResult, SpriteInfo, CueFileInfo, CueMeta,
        )
    ),
    tags(
        (name = "Jobs", description = "Thumbnail sprite and WebVTT generation jobs")
    )
)]
pub struct ApiDoc;
