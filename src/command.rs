//! Line-oriented input commands.
//!
//! ```text
//! F <a.b.c.d>/<len> <nic|-1>                     set or withdraw a forwarding rule
//! P <a.b.c.d> <packet id>                        forward a packet
//! S                                              print the forwarding table
//! U <a.b.c.d>/<len> <nic> <metric> <update id>   apply a routing update
//! R                                              print the learned routes
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use crate::error::RouterError;
use crate::forwarding::{ForwardingDecision, ForwardingEntry};
use crate::network::InterfaceId;
use crate::protocol::{Advertisement, RoutingUpdate};
use crate::router::Router;
use crate::routing_table::RouteRecord;
use crate::types::{Metric, Prefix};
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::{FromStr, SplitWhitespace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetRule {
        prefix: Prefix,
        interface: Option<InterfaceId>,
    },
    Forward {
        addr: u32,
        packet_id: u32,
    },
    DumpForwarding,
    Update(RoutingUpdate),
    DumpRoutes,
}

/// One printable record produced by a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output {
    Forwarded(ForwardingDecision),
    Entry(ForwardingEntry),
    Advertisement(Advertisement),
    Route(RouteRecord),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Forwarded(decision) => write!(f, "{}", decision),
            Output::Entry(entry) => write!(f, "{}", entry),
            Output::Advertisement(advertisement) => write!(f, "{}", advertisement),
            Output::Route(record) => write!(f, "{}", record),
        }
    }
}

impl Command {
    /// Parses one input line. Returns `Ok(None)` for blank and comment lines.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Command>, RouterError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        trimmed.parse().map(Some).map_err(|e: RouterError| e.at_line(line_no))
    }

    pub fn execute(self, router: &mut Router) -> Result<Vec<Output>, RouterError> {
        match self {
            Command::SetRule { prefix, interface } => {
                router.set_forwarding_rule(prefix, interface)?;
                Ok(Vec::new())
            }
            Command::Forward { addr, packet_id } => {
                Ok(vec![Output::Forwarded(router.forward(addr, packet_id))])
            }
            Command::DumpForwarding => Ok(router.forwarding_table().map(Output::Entry).collect()),
            Command::Update(update) => Ok(router
                .process_routing_update(update)?
                .map(Output::Advertisement)
                .into_iter()
                .collect()),
            Command::DumpRoutes => Ok(router.routes().cloned().map(Output::Route).collect()),
        }
    }
}

impl FromStr for Command {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let command = match tokens.next() {
            Some("F") => Command::SetRule {
                prefix: prefix(&mut tokens)?,
                interface: interface(&mut tokens, true)?,
            },
            Some("P") => Command::Forward {
                addr: u32::from(field::<Ipv4Addr>(&mut tokens, "address")?),
                packet_id: field(&mut tokens, "packet id")?,
            },
            Some("S") => Command::DumpForwarding,
            Some("U") => {
                let prefix = prefix(&mut tokens)?;
                let interface = interface(&mut tokens, false)?
                    .ok_or_else(|| RouterError::parse(0, "routing update needs an interface"))?;
                Command::Update(RoutingUpdate {
                    prefix,
                    interface,
                    metric: field::<Metric>(&mut tokens, "metric")?,
                    update_id: field(&mut tokens, "update id")?,
                })
            }
            Some("R") => Command::DumpRoutes,
            Some(other) => {
                return Err(RouterError::parse(0, format!("unknown command `{}`", other)));
            }
            None => return Err(RouterError::parse(0, "empty command")),
        };

        if let Some(extra) = tokens.next() {
            return Err(RouterError::parse(0, format!("unexpected trailing input `{}`", extra)));
        }
        Ok(command)
    }
}

fn next_token<'a>(tokens: &mut SplitWhitespace<'a>, name: &str) -> Result<&'a str, RouterError> {
    tokens
        .next()
        .ok_or_else(|| RouterError::parse(0, format!("missing {}", name)))
}

fn field<T: FromStr>(tokens: &mut SplitWhitespace<'_>, name: &str) -> Result<T, RouterError> {
    let token = next_token(tokens, name)?;
    token
        .parse()
        .map_err(|_| RouterError::parse(0, format!("invalid {} `{}`", name, token)))
}

fn prefix(tokens: &mut SplitWhitespace<'_>) -> Result<Prefix, RouterError> {
    next_token(tokens, "prefix")?.parse()
}

/// `-1` stands for "no interface" where `allow_none` is set. Range checks
/// against the router's interface count happen on execution.
fn interface(
    tokens: &mut SplitWhitespace<'_>,
    allow_none: bool,
) -> Result<Option<InterfaceId>, RouterError> {
    let token = next_token(tokens, "interface")?;
    match token.parse::<i64>() {
        Ok(-1) if allow_none => Ok(None),
        Ok(index) if index >= 0 => usize::try_from(index)
            .map(|index| Some(InterfaceId(index)))
            .map_err(|_| RouterError::parse(0, format!("invalid interface `{}`", token))),
        _ => Err(RouterError::parse(0, format!("invalid interface `{}`", token))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;
    use pretty_assertions::assert_eq;

    fn run(router: &mut Router, line: &str) -> Vec<String> {
        Command::parse_line(line, 1)
            .unwrap()
            .unwrap()
            .execute(router)
            .unwrap()
            .iter()
            .map(|o| o.to_string())
            .collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "F 10.0.0.0/8 2".parse::<Command>().unwrap(),
            Command::SetRule {
                prefix: "10.0.0.0/8".parse().unwrap(),
                interface: Some(InterfaceId(2)),
            }
        );
        assert_eq!(
            "F 10.0.0.0/8 -1".parse::<Command>().unwrap(),
            Command::SetRule {
                prefix: "10.0.0.0/8".parse().unwrap(),
                interface: None,
            }
        );
        assert_eq!(
            "P 10.0.5.5 17".parse::<Command>().unwrap(),
            Command::Forward {
                addr: u32::from(Ipv4Addr::new(10, 0, 5, 5)),
                packet_id: 17,
            }
        );
        assert_eq!(
            "U 192.168.1.0/24 0 1 7".parse::<Command>().unwrap(),
            Command::Update(RoutingUpdate {
                prefix: "192.168.1.0/24".parse().unwrap(),
                interface: InterfaceId(0),
                metric: 1,
                update_id: 7,
            })
        );
        assert_eq!("S".parse::<Command>().unwrap(), Command::DumpForwarding);
        assert_eq!("  R  ".parse::<Command>().unwrap(), Command::DumpRoutes);
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(Command::parse_line("", 1).unwrap(), None);
        assert_eq!(Command::parse_line("   ", 2).unwrap(), None);
        assert_eq!(Command::parse_line("# F 10.0.0.0/8 1", 3).unwrap(), None);
    }

    #[test]
    fn test_malformed_lines_are_parse_errors() {
        for line in [
            "X 1 2",
            "F 10.0.0.0/8",
            "F 10.0.0.0 1",
            "F 10.0.0.0/8 -2",
            "P 10.0.0 1",
            "P 10.0.0.1 -4",
            "U 10.0.0.0/8 -1 1 1",
            "U 10.0.0.0/8 0 x 1",
            "S extra",
        ] {
            let err = Command::parse_line(line, 9).unwrap_err();
            assert!(err.is_parse_error(), "{}: {:?}", line, err);
            assert!(err.to_string().starts_with("line 9: "), "{}", err);
        }
    }

    #[test]
    fn test_bad_prefix_length_is_a_caller_error() {
        assert_eq!(
            Command::parse_line("F 10.0.0.0/33 1", 4).unwrap_err(),
            RouterError::InvalidPrefixLength(33)
        );
    }

    #[test]
    fn test_execute_produces_outputs() {
        let mut router = Router::initialize(RouterConfig::default()).unwrap();
        assert!(run(&mut router, "F 10.0.0.0/8 0").is_empty());
        assert!(run(&mut router, "F 10.0.0.0/16 1").is_empty());
        assert_eq!(run(&mut router, "P 10.0.5.5 1"), vec!["O 1 1"]);
        assert_eq!(run(&mut router, "S"), vec!["10.0.0.0/8 0", "10.0.0.0/16 1"]);
        assert_eq!(
            run(&mut router, "U 192.168.1.0/24 0 1 7"),
            vec!["A 192.168.1.0/24 2 7\nT 192.168.1.0/24 0"]
        );
        assert!(run(&mut router, "U 192.168.1.0/24 1 9 8").is_empty());
        assert_eq!(run(&mut router, "R").len(), 1);
    }

    #[test]
    fn test_execute_rejects_out_of_range_interface() {
        let mut router = Router::initialize(RouterConfig::new(2, 16)).unwrap();
        let command = Command::parse_line("F 10.0.0.0/8 5", 1).unwrap().unwrap();
        assert_eq!(
            command.execute(&mut router).unwrap_err(),
            RouterError::InterfaceOutOfRange {
                index: 5,
                num_nics: 2
            }
        );
    }

    #[test]
    fn test_output_json() {
        let output = Output::Forwarded(ForwardingDecision {
            packet_id: 3,
            interface: None,
        });
        assert_eq!(
            serde_json::to_string(&output).unwrap(),
            r#"{"type":"forwarded","packet_id":3,"interface":null}"#
        );
    }
}
