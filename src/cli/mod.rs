//! Interactive front end.
//!
//! The `slipcheck` binary maps its subcommands onto library services
//! directly. The `session` subcommand is a chat-style loop whose message
//! handling lives here so it can be exercised without a terminal.
//!
//! # Session commands
//!
//! | Message | Reply |
//! |---------|-------|
//! | `/start` | Welcome text |
//! | `/help` | Usage text |
//! | `/expiredays [N]` | Show or set the retention window |
//! | `/decode <code>` | Decode a coupon and check its matches |
//! | short alphanumeric text | Treated as `/decode <text>` |
//! | anything else | Parsed as a slip |

mod session;

pub use session::{HELP, MessageReader, Session, WELCOME};
