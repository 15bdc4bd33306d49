pub mod asset_dto;
pub mod claims_dto;
pub mod draft_dto;
pub mod event_dto;
pub mod league_dto;
pub mod pick_dto;
pub mod team_dto;
