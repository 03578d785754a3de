pub mod candidature_dto;
pub mod directory_dto;
pub mod hiring_request_dto;
pub mod notification_dto;
