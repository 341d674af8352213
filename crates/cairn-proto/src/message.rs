//! DNS message representation.
//!
//! A DNS message consists of a header, question section, and three
//! resource record sections (answer, authority, additional). The OPT
//! pseudo-record, when present, lives in the additional section like any
//! other record; [`Message::edns`] gives a typed view of it.

use crate::edns::Edns;
use crate::error::{Error, Result};
use crate::header::{Header, HeaderFlags, SectionCounts};
use crate::question::Question;
use crate::rcode::ResponseCode;
use crate::record::ResourceRecord;
use crate::rtype::RecordType;
use crate::wire::{WireReader, WireWriter};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A complete DNS message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The message header.
    pub header: Header,
    /// The question section.
    pub questions: Vec<Question>,
    /// The answer section.
    pub answers: Vec<ResourceRecord>,
    /// The authority section.
    pub authorities: Vec<ResourceRecord>,
    /// The additional section, OPT included.
    pub additionals: Vec<ResourceRecord>,
}

fn section_len(records: usize) -> Result<u16> {
    u16::try_from(records).map_err(|_| Error::MessageTooLarge {
        size: records,
        max_size: usize::from(u16::MAX),
    })
}

fn read_records(
    reader: &mut WireReader<'_>,
    count: u16,
    into: &mut Vec<ResourceRecord>,
) -> Result<()> {
    for _ in 0..count {
        if let Some(record) = ResourceRecord::read(reader)? {
            into.push(record);
        }
    }
    Ok(())
}

impl Message {
    /// Creates a message with the given header and empty sections.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            ..Self::default()
        }
    }

    /// Creates a single-question query.
    pub fn query(id: u16, question: Question) -> Self {
        Self {
            header: Header::new(id),
            questions: vec![question],
            ..Self::default()
        }
    }

    /// Creates the skeleton of a response to `request`.
    ///
    /// The request is copied with QR set and the additional section
    /// cleared. Id, opcode, RD, questions, answers and authorities are
    /// echoed.
    pub fn response_from_request(request: &Self) -> Self {
        let mut response = request.clone();
        response.header.set_flag(HeaderFlags::QR, true);
        response.additionals.clear();
        response
    }

    /// Returns the first question if present.
    #[inline]
    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Returns the message id.
    #[inline]
    pub const fn id(&self) -> u16 {
        self.header.id
    }

    /// Returns the response code.
    #[inline]
    pub const fn rcode(&self) -> ResponseCode {
        self.header.rcode
    }

    /// Sets the response code, carrying the extended bits into OPT when
    /// one is present.
    pub fn set_rcode(&mut self, rcode: ResponseCode) {
        self.header.rcode = rcode;
        if let Some(opt) = self.opt_mut() {
            opt.ttl = (opt.ttl & 0x00FF_FFFF) | u32::from(rcode.extended_rcode()) << 24;
        }
    }

    /// Returns the EDNS view of the first OPT additional.
    pub fn edns(&self) -> Option<Edns> {
        self.additionals.iter().find_map(Edns::from_record)
    }

    /// Replaces any OPT record with `edns`, or removes it for `None`.
    pub fn set_edns(&mut self, edns: Option<&Edns>) {
        self.additionals.retain(|r| !r.is_type(RecordType::OPT));
        if let Some(edns) = edns {
            self.additionals.push(edns.to_record());
        }
    }

    fn opt_mut(&mut self) -> Option<&mut ResourceRecord> {
        self.additionals
            .iter_mut()
            .find(|r| r.is_type(RecordType::OPT))
    }

    /// Returns the section counts this message would carry on the wire.
    pub fn counts(&self) -> Result<SectionCounts> {
        Ok(SectionCounts {
            questions: section_len(self.questions.len())?,
            answers: section_len(self.answers.len())?,
            authorities: section_len(self.authorities.len())?,
            additionals: section_len(self.additionals.len())?,
        })
    }

    /// Parses a DNS message from wire format.
    ///
    /// A malformed header rejects the packet. After that, parsing is
    /// best-effort: a record whose RDATA does not decode is skipped, and a
    /// malformed name or fixed field ends parsing with the entries decoded
    /// so far.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = WireReader::new(data);
        let (header, counts) = Header::read(&mut reader)?;
        let mut message = Self::new(header);

        if let Err(error) = message.read_sections(&mut reader, counts) {
            debug!(
                %error,
                offset = reader.position(),
                questions = message.questions.len(),
                answers = message.answers.len(),
                "stopped parsing at malformed entry"
            );
        }

        if let Some(edns) = message.edns() {
            message.header.rcode =
                ResponseCode::from_parts(message.header.rcode.header_rcode(), edns.extended_rcode);
        }

        Ok(message)
    }

    fn read_sections(&mut self, reader: &mut WireReader<'_>, counts: SectionCounts) -> Result<()> {
        for _ in 0..counts.questions {
            self.questions.push(Question::read(reader)?);
        }
        read_records(reader, counts.answers, &mut self.answers)?;
        read_records(reader, counts.authorities, &mut self.authorities)?;
        read_records(reader, counts.additionals, &mut self.additionals)
    }

    /// Serializes the message.
    ///
    /// Section counts are recomputed from the sections. Names are written
    /// uncompressed.
    pub fn to_wire(&self) -> Result<Bytes> {
        let mut writer = WireWriter::new(512);
        self.header.write(&mut writer, self.counts()?)?;
        for question in &self.questions {
            question.write(&mut writer);
        }
        for record in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additionals)
        {
            record.write(&mut writer)?;
        }
        Ok(writer.freeze())
    }

    /// Serializes the message into at most `max_size` bytes.
    ///
    /// When the full message does not fit, records are dropped from the end
    /// (additional first, OPT kept, then authority, then answer) until it
    /// does, and TC is set.
    pub fn truncated(&self, max_size: usize) -> Result<Bytes> {
        let wire = self.to_wire()?;
        if wire.len() <= max_size {
            return Ok(wire);
        }

        let mut reply = self.clone();
        reply.header.set_flag(HeaderFlags::TC, true);
        loop {
            if let Some(i) = reply
                .additionals
                .iter()
                .rposition(|r| !r.is_type(RecordType::OPT))
            {
                reply.additionals.remove(i);
            } else if reply.authorities.pop().is_none() && reply.answers.pop().is_none() {
                let wire = reply.to_wire()?;
                if wire.len() > max_size {
                    return Err(Error::MessageTooLarge {
                        size: wire.len(),
                        max_size,
                    });
                }
                return Ok(wire);
            }

            let wire = reply.to_wire()?;
            if wire.len() <= max_size {
                return Ok(wire);
            }
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            ";; ->>HEADER<<- {}; QUERY: {}, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}",
            self.header,
            self.questions.len(),
            self.answers.len(),
            self.authorities.len(),
            self.additionals.len()
        )?;

        if let Some(edns) = self.edns() {
            writeln!(f, "\n;; OPT PSEUDOSECTION:\n{edns}")?;
        }

        writeln!(f, "\n;; QUESTION SECTION:")?;
        for q in &self.questions {
            writeln!(f, "{q}")?;
        }

        for (title, records) in [
            ("ANSWER", &self.answers),
            ("AUTHORITY", &self.authorities),
            ("ADDITIONAL", &self.additionals),
        ] {
            let mut shown = records
                .iter()
                .filter(|r| !r.is_type(RecordType::OPT))
                .peekable();
            if shown.peek().is_some() {
                writeln!(f, "\n;; {title} SECTION:")?;
                for r in shown {
                    writeln!(f, "{r}")?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::RecordClass;
    use crate::edns::{ClientSubnet, EdnsOption};
    use crate::header::HEADER_SIZE;
    use crate::name::Name;
    use crate::opcode::OpCode;
    use crate::rdata::{RData, A};
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    fn question() -> Question {
        Question::new(
            Name::from_str("example.com").unwrap(),
            RecordType::A,
            RecordClass::IN,
        )
    }

    fn a_record(owner: &str, last: u8) -> ResourceRecord {
        ResourceRecord::new(
            Name::from_str(owner).unwrap(),
            300,
            RData::A(A::new(Ipv4Addr::new(192, 0, 2, last))),
        )
    }

    #[test]
    fn test_counts_recomputed() {
        let mut msg = Message::query(0x1234, question());
        msg.answers.push(a_record("example.com", 1));
        msg.answers.push(a_record("example.com", 2));
        let wire = msg.to_wire().unwrap();
        assert_eq!(&wire[4..12], &[0, 1, 0, 2, 0, 0, 0, 0]);

        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_response_from_request() {
        let mut request = Message::query(7, question());
        request.header.set_flag(HeaderFlags::RD, true);
        request.header.opcode = OpCode::Notify;
        request.set_edns(Some(&Edns::new(1232)));

        let response = Message::response_from_request(&request);
        assert!(response.header.is_response());
        assert!(response.header.flags.contains(HeaderFlags::RD));
        assert_eq!(response.header.opcode, OpCode::Notify);
        assert_eq!(response.id(), 7);
        assert_eq!(response.questions, request.questions);
        assert!(response.additionals.is_empty());
    }

    #[test]
    fn test_edns_view() {
        let mut msg = Message::query(1, question());
        let mut edns = Edns::new(4096);
        edns.options.push(EdnsOption::ClientSubnet(ClientSubnet::new(
            "198.51.100.0".parse().unwrap(),
            24,
        )));
        msg.set_edns(Some(&edns));

        let parsed = Message::parse(&msg.to_wire().unwrap()).unwrap();
        let view = parsed.edns().unwrap();
        assert_eq!(view.udp_size, 4096);
        assert_eq!(view.client_subnet().map(|s| s.source_prefix), Some(24));
    }

    #[test]
    fn test_extended_rcode_through_opt() {
        let mut msg = Message::query(1, question());
        msg.set_edns(Some(&Edns::new(1232)));
        msg.set_rcode(ResponseCode::BadVers);
        let wire = msg.to_wire().unwrap();
        assert_eq!(wire[3] & 0x0F, 0);

        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(parsed.rcode(), ResponseCode::BadVers);
    }

    #[test]
    fn test_header_error_rejects_packet() {
        assert!(Message::parse(&[0; 5]).is_err());
    }

    #[test]
    fn test_malformed_rdata_skips_only_that_record() {
        let mut msg = Message::query(9, question());
        msg.answers.push(a_record("example.com", 1));
        msg.answers.push(a_record("example.com", 2));
        let mut wire = msg.to_wire().unwrap().to_vec();

        // Shrink the first answer's RDLENGTH from 4 to 3 and drop one
        // address byte so the second record still lines up.
        let first_rdlength = HEADER_SIZE + 17 + 13 + 8;
        assert_eq!(&wire[first_rdlength..first_rdlength + 2], &[0, 4]);
        wire[first_rdlength + 1] = 3;
        wire.remove(first_rdlength + 2);

        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(parsed.answers, vec![a_record("example.com", 2)]);
    }

    #[test]
    fn test_truncated_name_keeps_earlier_entries() {
        let mut msg = Message::query(9, question());
        msg.answers.push(a_record("example.com", 1));
        let mut wire = msg.to_wire().unwrap().to_vec();
        // Claim a second answer that is not there.
        wire[7] = 2;
        wire.push(0x05);

        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(parsed.questions.len(), 1);
        assert_eq!(parsed.answers.len(), 1);
    }

    #[test]
    fn test_truncated_fits_and_sets_tc() {
        let mut msg = Message::response_from_request(&Message::query(3, question()));
        for i in 0..100 {
            msg.answers.push(a_record(&format!("host{i}.example.com"), i));
        }
        msg.set_edns(Some(&Edns::new(512)));

        let wire = msg.truncated(512).unwrap();
        assert!(wire.len() <= 512);
        let parsed = Message::parse(&wire).unwrap();
        assert!(parsed.header.is_truncated());
        assert!(parsed.answers.len() < 100);
        assert!(parsed.edns().is_some());
    }

    #[test]
    fn test_small_message_untouched() {
        let msg = Message::query(3, question());
        let wire = msg.truncated(512).unwrap();
        assert_eq!(wire, msg.to_wire().unwrap());
    }

    #[test]
    fn test_display_sections() {
        let mut msg = Message::response_from_request(&Message::query(3, question()));
        msg.answers.push(a_record("example.com", 1));
        let text = msg.to_string();
        assert!(text.contains("status: NOERROR"));
        assert!(text.contains(";; ANSWER SECTION:\nexample.com.\t300\tIN\tA\t192.0.2.1"));
        assert!(!text.contains("AUTHORITY SECTION"));
    }
}
