/// Creates a single transcript [`Message`](crate::Message) from a role shorthand.
///
/// ```rust
/// use toolrelay::{Role, tr_msg};
///
/// let message = tr_msg!(assistant => "Done.");
/// assert_eq!(message.role(), Role::Assistant);
/// assert_eq!(message.content(), "Done.");
/// ```
#[macro_export]
macro_rules! tr_msg {
    (system => $content:expr $(,)?) => {
        $crate::Message::system($content)
    };
    (user => $content:expr $(,)?) => {
        $crate::Message::user($content)
    };
    (assistant => $content:expr $(,)?) => {
        $crate::Message::assistant($content)
    };
    (function => $content:expr $(,)?) => {
        $crate::Message::function($content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use system, user, assistant, or function");
    };
}

/// Creates a `Vec<Message>` from role/content pairs.
///
/// ```rust
/// use toolrelay::{Role, tr_messages};
///
/// let messages = tr_messages![
///     system => "Answer briefly.",
///     user => "In which year did WW2 start?",
/// ];
///
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].role(), Role::System);
/// assert_eq!(messages[1].role(), Role::User);
/// ```
#[macro_export]
macro_rules! tr_messages {
    () => {
        Vec::<$crate::Message>::new()
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::tr_msg!($role => $content)),+]
    };
}
