//! Synthetic trace writer shared by the integration tests.

#![allow(dead_code)]

use block_trace_studio::utils::config::{CURRENT_VERSION, PROFILER_SIGNATURE};

/// One record of a thread group: `(begin, end, id, runtime name)`
#[derive(Debug, Clone)]
pub struct Record {
    pub begin: u64,
    pub end: u64,
    pub id: u32,
    pub name: Vec<u8>,
}

pub fn rec(begin: u64, end: u64, id: u32) -> Record {
    Record {
        begin,
        end,
        id,
        name: Vec::new(),
    }
}

pub fn named(begin: u64, end: u64, id: u32, name: &str) -> Record {
    named_bytes(begin, end, id, name.as_bytes())
}

/// Record whose runtime name is not necessarily UTF-8
pub fn named_bytes(begin: u64, end: u64, id: u32, name: &[u8]) -> Record {
    Record {
        begin,
        end,
        id,
        name: name.to_vec(),
    }
}

#[derive(Debug, Clone)]
struct Group {
    thread_id: u64,
    name: String,
    sync: Vec<Record>,
    blocks: Vec<Record>,
}

/// Builds a trace file in memory
#[derive(Debug, Clone)]
pub struct TraceBuilder {
    pub signature: u32,
    pub version: u32,
    pub cpu_frequency: i64,
    pub begin_time: u64,
    pub end_time: u64,
    /// Overrides the computed block count when set
    pub declared_blocks: Option<u32>,
    descriptors: Vec<Option<Vec<u8>>>,
    groups: Vec<Group>,
}

impl Default for TraceBuilder {
    fn default() -> Self {
        Self {
            signature: PROFILER_SIGNATURE,
            version: CURRENT_VERSION,
            cpu_frequency: 0,
            begin_time: 0,
            end_time: 1_000,
            declared_blocks: None,
            descriptors: Vec::new(),
            groups: Vec::new(),
        }
    }
}

pub fn descriptor_payload(name: &str, file: &str, line: i32, event: bool) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&line.to_le_bytes());
    bytes.extend_from_slice(&0xff80_8080u32.to_le_bytes());
    bytes.push(if event { 0 } else { 1 });
    bytes.push(1);
    bytes.extend_from_slice(&((name.len() + 1) as u16).to_le_bytes());
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(file.as_bytes());
    bytes.push(0);
    bytes
}

fn record_payload(record: &Record) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&record.begin.to_le_bytes());
    bytes.extend_from_slice(&record.end.to_le_bytes());
    bytes.extend_from_slice(&record.id.to_le_bytes());
    bytes.extend_from_slice(&record.name);
    bytes.push(0);
    bytes
}

fn push_sized(out: &mut Vec<u8>, payload: &[u8]) {
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block descriptor; ids follow insertion order
    pub fn block(mut self, name: &str) -> Self {
        self.descriptors
            .push(Some(descriptor_payload(name, "main.cpp", 10, false)));
        self
    }

    pub fn event(mut self, name: &str) -> Self {
        self.descriptors
            .push(Some(descriptor_payload(name, "main.cpp", 20, true)));
        self
    }

    /// Removed descriptor slot
    pub fn removed(mut self) -> Self {
        self.descriptors.push(None);
        self
    }

    pub fn thread(mut self, thread_id: u64, name: &str, blocks: Vec<Record>) -> Self {
        self.groups.push(Group {
            thread_id,
            name: name.to_string(),
            sync: Vec::new(),
            blocks,
        });
        self
    }

    pub fn thread_with_sync(
        mut self,
        thread_id: u64,
        name: &str,
        sync: Vec<Record>,
        blocks: Vec<Record>,
    ) -> Self {
        self.groups.push(Group {
            thread_id,
            name: name.to_string(),
            sync,
            blocks,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut descriptor_table = Vec::new();
        for descriptor in &self.descriptors {
            match descriptor {
                Some(payload) => push_sized(&mut descriptor_table, payload),
                None => descriptor_table.extend_from_slice(&0u16.to_le_bytes()),
            }
        }

        let mut body = Vec::new();
        let mut record_count = 0u32;
        let mut memory = 0u64;
        for group in &self.groups {
            body.extend_from_slice(&group.thread_id.to_le_bytes());
            let mut name = group.name.as_bytes().to_vec();
            if !name.is_empty() {
                name.push(0);
            }
            body.extend_from_slice(&(name.len() as u16).to_le_bytes());
            body.extend_from_slice(&name);

            for section in [&group.sync, &group.blocks] {
                body.extend_from_slice(&(section.len() as u32).to_le_bytes());
                for record in section.iter() {
                    let payload = record_payload(record);
                    memory += payload.len() as u64;
                    record_count += 1;
                    push_sized(&mut body, &payload);
                }
            }
        }

        let mut out = Vec::new();
        out.extend_from_slice(&self.signature.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.cpu_frequency.to_le_bytes());
        out.extend_from_slice(&self.begin_time.to_le_bytes());
        out.extend_from_slice(&self.end_time.to_le_bytes());
        out.extend_from_slice(&self.declared_blocks.unwrap_or(record_count).to_le_bytes());
        out.extend_from_slice(&memory.max(1).to_le_bytes());
        out.extend_from_slice(&(self.descriptors.len() as u32).to_le_bytes());
        out.extend_from_slice(&(descriptor_table.len() as u64).max(1).to_le_bytes());
        out.extend_from_slice(&descriptor_table);
        out.extend_from_slice(&body);
        out
    }
}
