//! Session state reported by the server.
use std::fmt;

/// Transaction status reported by `ReadyForQuery`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TransactionStatus {
    /// Idle, not in a transaction block.
    NoTransaction,
    /// In a transaction block.
    InTransaction,
    /// In a failed transaction block, queries are rejected until block end.
    FailedTransaction,
}

impl TransactionStatus {
    /// Returns [`None`] for an unknown status byte.
    pub fn from_byte(status: u8) -> Option<TransactionStatus> {
        match status {
            b'I' => Some(Self::NoTransaction),
            b'T' => Some(Self::InTransaction),
            b'E' => Some(Self::FailedTransaction),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Self::NoTransaction => b'I',
            Self::InTransaction => b'T',
            Self::FailedTransaction => b'E',
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoTransaction => "no_transaction",
            Self::InTransaction => "in_transaction",
            Self::FailedTransaction => "failed_transaction",
        })
    }
}

/// An asynchronous notification, raised by `NOTIFY`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Notification {
    /// Process ID of the notifying backend.
    pub pid: u32,
    /// Channel name.
    pub condition: String,
    /// Payload string.
    pub info: String,
}

/// A single field of a server notice.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Notice {
    /// Field type code, e.g. `M` for message.
    pub field_type: char,
    pub value: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_byte() {
        for b in [b'I', b'T', b'E'] {
            assert_eq!(TransactionStatus::from_byte(b).unwrap().as_byte(), b);
        }
        assert_eq!(TransactionStatus::from_byte(b'X'), None);
        assert_eq!(TransactionStatus::FailedTransaction.to_string(), "failed_transaction");
    }
}
