//! Utility Types
//!
//! Every value that crosses the API boundary and carries a rule (emails,
//! phone numbers, passwords, amounts...) gets its own newtype here. The
//! types validate in [FromStr](std::str::FromStr) and deserialize through
//! it, so a handler receiving one can rely on it being well formed.

mod amount;
mod email;
mod identifier;
mod mobile;
mod name_of_user;
mod password;
mod title;

pub(crate) use amount::Amount;
pub(crate) use email::EMail;
pub(crate) use identifier::Identifier;
pub(crate) use mobile::Mobile;
pub(crate) use name_of_user::NameOfUser;
pub(crate) use password::Password;
pub(crate) use title::Title;
