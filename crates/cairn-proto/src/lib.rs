//! # Cairn DNS Protocol Library
//!
//! Wire format parsing and serialization for an authoritative DNS server,
//! following RFC 1035 with the EDNS(0) (RFC 6891) and Client Subnet
//! (RFC 7871) extensions.
//!
//! ## Layers
//!
//! - **Bit cursors** ([`wire`]): sub-byte reads and writes for header fields
//! - **Names** ([`name`]): label encoding with compression-pointer decoding
//! - **Messages** ([`message`]): header, questions and the three record sections
//! - **RDATA** ([`rdata`]): one variant per supported record type, with an
//!   opaque fallback for everything else
//! - **EDNS** ([`edns`]): the OPT pseudo-record and its option sub-codec
//!
//! ## Example
//!
//! ```rust,ignore
//! use cairn_proto::{Message, Question, Name, RecordType, RecordClass};
//!
//! let query = Message::query(
//!     0x1234,
//!     Question::new(Name::from_str("example.com.")?, RecordType::A, RecordClass::IN),
//! );
//! let wire = query.to_wire()?;
//! let parsed = Message::parse(&wire)?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

pub mod class;
pub mod edns;
pub mod error;
pub mod header;
pub mod message;
pub mod name;
pub mod opcode;
pub mod question;
pub mod rcode;
pub mod rdata;
pub mod record;
pub mod rtype;
pub mod wire;

// Re-exports for convenience
pub use class::{Class, RecordClass};
pub use edns::{ClientSubnet, Edns, EdnsOption};
pub use error::{Error, Result};
pub use header::{Header, HeaderFlags};
pub use message::Message;
pub use name::Name;
pub use opcode::OpCode;
pub use question::Question;
pub use rcode::ResponseCode;
pub use rdata::RData;
pub use record::ResourceRecord;
pub use rtype::{RecordType, Type};

/// Maximum length of a DNS label (63 bytes per RFC 1035)
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum length of a domain name (255 bytes per RFC 1035)
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum size of a UDP DNS message without EDNS0 (512 bytes per RFC 1035)
pub const MAX_UDP_MESSAGE_SIZE: usize = 512;

/// Default EDNS0 UDP payload size advertised in responses.
pub const DEFAULT_EDNS_UDP_SIZE: u16 = 1232;

/// Maximum size of a DNS message carried over TCP.
pub const MAX_TCP_MESSAGE_SIZE: usize = 65535;

/// DNS port (53)
pub const DNS_PORT: u16 = 53;
