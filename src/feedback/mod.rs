//! 相关反馈：会话状态与贝叶斯权重更新

mod bayes;
mod session;
mod store;

pub use bayes::update_weights;
pub use session::*;
pub use store::{MemorySessionStore, SessionStore};
