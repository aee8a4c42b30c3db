//! Domain models for mailbox ownership records

mod email;
mod email_user;
mod folder;
mod ids;

pub use email::{Email, EmailBuilder, EmailThread};
pub use email_user::{EmailUser, NewEmailUser, SeenFilter};
pub use folder::{EmailFolder, EmailOrigin, FolderType};
pub use ids::{
    EmailId, EmailUserId, FolderId, MailboxId, OrganizationId, OriginId, ThreadId, UserId, raw_ids,
};
