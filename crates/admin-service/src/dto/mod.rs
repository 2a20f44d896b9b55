//! 数据传输对象
//!
//! - `request`: 请求体与查询参数
//! - `response`: 统一响应结构与各接口的响应数据

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
