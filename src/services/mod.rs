pub mod hiring_request_service;
pub mod notification_service;
pub mod workflow_service;
