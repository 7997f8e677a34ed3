pub mod content_type_service;

pub use content_type_service::{
    ContentTypeService, ContentTypeServiceError, ContentTypeServiceResult,
};
