/// 面向终端用户的提示（瑞典语、非技术性、可关闭）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotice {
    pub code: &'static str,
    pub message: String,
}

impl UserNotice {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
