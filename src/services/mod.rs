pub mod auditor;
pub mod auth_user;
pub mod coordinator;
pub mod pick_timer;
pub mod roster_rules;
pub mod scheduler;
pub mod validator;
pub mod websocket;
