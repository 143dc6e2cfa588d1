//! Table-driven status code checking
//!
//! Reader replies end in a one- or two-byte status code (ISO 7816 uses the
//! trailing SW1/SW2 pair). A [`StatusChecker`] holds an ordered rule list
//! mapping codes to typed outcomes; insertion order is evaluation order and
//! the first matching rule wins, so a vendor profile can prepend rules that
//! are more specific than a shared base table.

use std::fmt;

/// Failure classification for a matched status rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    /// Authentication or access-condition refusal
    Security,

    /// Wrong length, parameter or reference
    Parameter,

    /// Non-volatile memory problem on the card or reader
    Memory,

    /// Instruction or function not supported
    Unsupported,

    /// Command not allowed in the current card state
    State,

    /// Corrupted or inconsistent data
    Integrity,

    /// Reader- or device-level fault without precise diagnosis
    Device,
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Security => "security",
            Self::Parameter => "parameter",
            Self::Memory => "memory",
            Self::Unsupported => "unsupported",
            Self::State => "state",
            Self::Integrity => "integrity",
            Self::Device => "device",
        };
        f.write_str(name)
    }
}

/// What a matched rule means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleEffect {
    /// The code reports successful execution
    Success,

    /// The code reports a known device/card-level refusal
    Failure(StatusCategory),
}

/// How many trailing bytes of a response carry the status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWidth {
    /// One status byte (simple serial dialects)
    Single,

    /// Two status bytes (ISO 7816 SW1/SW2)
    Pair,
}

impl StatusWidth {
    pub fn len(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Pair => 2,
        }
    }
}

/// The raw code found at the end of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode {
    pub sw1: u8,
    pub sw2: Option<u8>,
}

impl StatusCode {
    /// Raw code bytes, in response order
    pub fn bytes(&self) -> Vec<u8> {
        match self.sw2 {
            Some(sw2) => vec![self.sw1, sw2],
            None => vec![self.sw1],
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sw2 {
            Some(sw2) => write!(f, "{:02X} {:02X}", self.sw1, sw2),
            None => write!(f, "{:02X}", self.sw1),
        }
    }
}

/// Typed result of checking one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Success,

    /// Matched a failure rule
    KnownFailure {
        category: StatusCategory,
        message: &'static str,
        code: StatusCode,
    },

    /// Status bytes present but unmapped; surfaced rather than swallowed so
    /// new vendor codes stay visible
    UnknownFailure { code: StatusCode },
}

impl StatusOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone)]
struct StatusRule {
    code1: u8,

    /// `None` matches any second byte (and is ignored for single width)
    code2: Option<u8>,

    message: &'static str,
    effect: RuleEffect,
}

/// Ordered status rule table for one reader protocol
#[derive(Debug, Clone)]
pub struct StatusChecker {
    width: StatusWidth,
    rules: Vec<StatusRule>,
    allow_empty_result: bool,
}

impl StatusChecker {
    /// Create an empty checker; empty replies are rejected by default
    pub fn new(width: StatusWidth) -> Self {
        Self {
            width,
            rules: Vec::new(),
            allow_empty_result: false,
        }
    }

    /// Tolerate zero-length replies (readers that answer nothing on success)
    pub fn with_allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty_result = allow;
        self
    }

    pub fn allow_empty_result(&self) -> bool {
        self.allow_empty_result
    }

    pub fn width(&self) -> StatusWidth {
        self.width
    }

    /// Append a rule; earlier rules take precedence
    pub fn add_rule(
        &mut self,
        code1: u8,
        code2: Option<u8>,
        message: &'static str,
        effect: RuleEffect,
    ) -> &mut Self {
        self.rules.push(StatusRule {
            code1,
            code2,
            message,
            effect,
        });
        self
    }

    /// Check the trailing status code of `response`
    ///
    /// An empty response checks as `Success` only when the checker allows
    /// empty results; the caller decides how to report a disallowed one.
    pub fn check(&self, response: &[u8]) -> StatusOutcome {
        if response.is_empty() {
            return StatusOutcome::Success;
        }

        let code = match self.read_code(response) {
            Some(code) => code,
            None => {
                // Too short to even hold the status code.
                return StatusOutcome::UnknownFailure {
                    code: StatusCode {
                        sw1: response[response.len() - 1],
                        sw2: None,
                    },
                };
            }
        };

        for rule in &self.rules {
            if !self.matches(rule, code) {
                continue;
            }
            return match rule.effect {
                RuleEffect::Success => StatusOutcome::Success,
                RuleEffect::Failure(category) => StatusOutcome::KnownFailure {
                    category,
                    message: rule.message,
                    code,
                },
            };
        }

        StatusOutcome::UnknownFailure { code }
    }

    fn read_code(&self, response: &[u8]) -> Option<StatusCode> {
        match self.width {
            StatusWidth::Single => Some(StatusCode {
                sw1: *response.last()?,
                sw2: None,
            }),
            StatusWidth::Pair => {
                if response.len() < 2 {
                    return None;
                }
                Some(StatusCode {
                    sw1: response[response.len() - 2],
                    sw2: Some(response[response.len() - 1]),
                })
            }
        }
    }

    fn matches(&self, rule: &StatusRule, code: StatusCode) -> bool {
        if rule.code1 != code.sw1 {
            return false;
        }
        match (self.width, rule.code2) {
            (StatusWidth::Single, _) | (_, None) => true,
            (StatusWidth::Pair, Some(expected)) => code.sw2 == Some(expected),
        }
    }

    /// Built-in ISO 7816-4 SW1/SW2 table
    pub fn iso7816() -> Self {
        use RuleEffect::{Failure, Success};
        use StatusCategory::*;

        let mut checker = Self::new(StatusWidth::Pair);
        checker
            .add_rule(0x90, Some(0x00), "Normal processing", Success)
            .add_rule(0x61, None, "Response bytes still available", Success)
            .add_rule(0x62, Some(0x82), "End of file reached", Failure(State))
            .add_rule(0x63, Some(0x00), "Verification failed", Failure(Security))
            .add_rule(0x65, Some(0x81), "Memory failure", Failure(Memory))
            .add_rule(0x67, Some(0x00), "Wrong length", Failure(Parameter))
            .add_rule(
                0x69,
                Some(0x82),
                "Security status not satisfied",
                Failure(Security),
            )
            .add_rule(
                0x69,
                Some(0x83),
                "Authentication method blocked",
                Failure(Security),
            )
            .add_rule(
                0x69,
                Some(0x85),
                "Conditions of use not satisfied",
                Failure(State),
            )
            .add_rule(0x6A, Some(0x80), "Incorrect command data", Failure(Integrity))
            .add_rule(0x6A, Some(0x81), "Function not supported", Failure(Unsupported))
            .add_rule(0x6A, Some(0x82), "File not found", Failure(Parameter))
            .add_rule(0x6A, Some(0x86), "Incorrect parameters P1-P2", Failure(Parameter))
            .add_rule(0x6B, Some(0x00), "Wrong parameters", Failure(Parameter))
            .add_rule(0x6D, Some(0x00), "Instruction not supported", Failure(Unsupported))
            .add_rule(0x6E, Some(0x00), "Class not supported", Failure(Unsupported))
            .add_rule(0x6F, Some(0x00), "No precise diagnosis", Failure(Device));
        checker
    }
}
