//! Emergency-help overlay. Static text, reachable from every step.

pub const HELP_TITLE: &str = "温馨提示";

pub const HELP_BODY: [&str; 2] = [
    "如果您现在感觉非常不安全，或者有伤害自己或他人的想法，请立刻放下手机，联系您当地的紧急求助电话（如：110、120）或寻找身边最亲近的人。",
    "记住：您并不孤单，总会有人愿意听您说话。",
];

pub const HELP_DISMISS: &str = "我知道了";

/// Entry label shown at the bottom of every screen.
pub const HELP_ENTRY: &str = "紧急帮助";

/// Visibility of the overlay. Kept apart from `Wizard` so opening and closing
/// it can never touch step, inputs or results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmergencyHelp {
    open: bool,
}

impl EmergencyHelp {
    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}
