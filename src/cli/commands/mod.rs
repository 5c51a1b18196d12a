mod history;
mod lookup;
mod user;

pub use history::cmd_history;
pub use lookup::{cmd_autocomplete, cmd_lookup};
pub use user::cmd_user_add;
