//! Data models for fastschema-link.
//!
//! Request/response bodies for the content, schema and auth endpoints, plus
//! the frames and scopes used by realtime subscriptions.

pub mod auth_data;
pub mod change_event;
pub mod content;
pub mod event_frame;
pub mod event_kind;
pub mod event_payload;
pub mod field;
pub mod filter;
pub mod list_options;
pub mod login;
pub mod media;
pub mod pagination;
pub mod record_id;
pub mod response_envelope;
pub mod schema_data;
pub mod scope;
pub mod subscribe_config;
pub mod token_claims;
pub mod upload_file;
pub mod user;


pub use auth_data::AuthData;
pub use change_event::ChangeEvent;
pub use content::Content;
pub use event_frame::EventFrame;
pub use event_kind::EventKind;
pub use event_payload::EventPayload;
pub use field::Field;
pub use filter::{Filter, FilterOperator};
pub use list_options::ListOptions;
pub use login::{LoginData, LoginResponse};
pub use media::{Media, UploadResult};
pub use pagination::Pagination;
pub use record_id::RecordId;
pub use response_envelope::{ResponseEnvelope, ResponseError};
pub use schema_data::{SchemaData, SchemaUpdateData};
pub use scope::Scope;
pub use subscribe_config::SubscribeConfig;
pub use token_claims::{TokenHeader, TokenPayload};
pub use upload_file::UploadFile;
pub use user::{Role, User};
