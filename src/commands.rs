//! Text commands understood by the bot

/// A parsed bot command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    Clown,
    ClownStats,
    AddMember {
        handle: String,
        display_name: Option<String>,
    },
    RemoveMember {
        handle: String,
    },
    ListMembers,
    InitMembers,
}

/// A known command with the wrong arguments
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Usage: {usage}")]
pub struct UsageError {
    pub usage: &'static str,
}

pub const ADD_MEMBER_USAGE: &str = "/addmember <username> [имя]";
pub const REMOVE_MEMBER_USAGE: &str = "/removemember <username>";

impl Command {
    /// Parse a message text.
    ///
    /// Returns `None` for anything that is not a command of this bot: plain
    /// text, unknown commands and commands addressed to another bot via
    /// `/command@otherbot`. Command names are case-sensitive.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Result<Command, UsageError>> {
        let mut words = text.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;
        let args: Vec<&str> = words.collect();

        let name = match head.split_once('@') {
            Some((name, target)) => {
                if let Some(bot) = bot_username {
                    if !target.eq_ignore_ascii_case(bot) {
                        return None;
                    }
                }
                name
            }
            None => head,
        };

        let command = match name {
            "start" => Ok(Command::Start),
            "help" => Ok(Command::Help),
            "clown" => Ok(Command::Clown),
            "clownstats" => Ok(Command::ClownStats),
            "listmembers" => Ok(Command::ListMembers),
            "initmembers" => Ok(Command::InitMembers),
            "addmember" => match args.split_first() {
                Some((handle, rest)) => Ok(Command::AddMember {
                    handle: handle.to_string(),
                    display_name: (!rest.is_empty()).then(|| rest.join(" ")),
                }),
                None => Err(UsageError {
                    usage: ADD_MEMBER_USAGE,
                }),
            },
            "removemember" => match args.as_slice() {
                [handle] => Ok(Command::RemoveMember {
                    handle: handle.to_string(),
                }),
                _ => Err(UsageError {
                    usage: REMOVE_MEMBER_USAGE,
                }),
            },
            _ => return None,
        };

        Some(command)
    }

    /// Command name without the leading slash, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Clown => "clown",
            Command::ClownStats => "clownstats",
            Command::AddMember { .. } => "addmember",
            Command::RemoveMember { .. } => "removemember",
            Command::ListMembers => "listmembers",
            Command::InitMembers => "initmembers",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Option<Result<Command, UsageError>> {
        Command::parse(text, Some("ClownDayBot"))
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("/start"), Some(Ok(Command::Start)));
        assert_eq!(parse("/help"), Some(Ok(Command::Help)));
        assert_eq!(parse("/clown"), Some(Ok(Command::Clown)));
        assert_eq!(parse("/clownstats"), Some(Ok(Command::ClownStats)));
        assert_eq!(parse("/listmembers"), Some(Ok(Command::ListMembers)));
        assert_eq!(parse("/initmembers"), Some(Ok(Command::InitMembers)));
        // Extra words are ignored for commands without arguments
        assert_eq!(parse("/clown please"), Some(Ok(Command::Clown)));
    }

    #[test]
    fn test_non_commands_are_ignored() {
        assert_eq!(parse("clown"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("/unknown"), None);
    }

    #[test]
    fn test_commands_are_case_sensitive() {
        assert_eq!(parse("/Clown"), None);
        assert_eq!(parse("/CLOWNSTATS"), None);
    }

    #[test]
    fn test_bot_suffix() {
        assert_eq!(parse("/clown@ClownDayBot"), Some(Ok(Command::Clown)));
        assert_eq!(parse("/clown@clowndaybot"), Some(Ok(Command::Clown)));
        assert_eq!(parse("/clown@SomeOtherBot"), None);
        // Without a known bot name any suffix is accepted
        assert_eq!(
            Command::parse("/clown@Whatever", None),
            Some(Ok(Command::Clown))
        );
    }

    #[test]
    fn test_addmember() {
        assert_eq!(
            parse("/addmember @vasya"),
            Some(Ok(Command::AddMember {
                handle: "@vasya".to_string(),
                display_name: None,
            }))
        );
        assert_eq!(
            parse("/addmember vasya Василий  Пупкин"),
            Some(Ok(Command::AddMember {
                handle: "vasya".to_string(),
                display_name: Some("Василий Пупкин".to_string()),
            }))
        );
        assert_eq!(
            parse("/addmember"),
            Some(Err(UsageError {
                usage: ADD_MEMBER_USAGE
            }))
        );
    }

    #[test]
    fn test_removemember_requires_exactly_one_argument() {
        assert_eq!(
            parse("/removemember@ClownDayBot petya"),
            Some(Ok(Command::RemoveMember {
                handle: "petya".to_string()
            }))
        );
        assert_eq!(
            parse("/removemember"),
            Some(Err(UsageError {
                usage: REMOVE_MEMBER_USAGE
            }))
        );
        assert_eq!(
            parse("/removemember a b"),
            Some(Err(UsageError {
                usage: REMOVE_MEMBER_USAGE
            }))
        );
    }
}
