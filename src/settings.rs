//! MCPHub `mcp_settings.json`: load, patch one server's `env.API_HEADERS`, write back.
//!
//! The document is kept as a `serde_json::Value` (with `preserve_order`) so every key we do not
//! touch survives the rewrite in its original order, and `arbitrary_precision` keeps every number's
//! original text. Output is 2-space indented, non-ASCII escaped as `\uXXXX`, with no trailing newline,
//! so re-saving a written file is byte-identical.

use anyhow::Context;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::{Map, Value};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SERVERS_KEY: &str = "mcpServers";
pub const ENV_KEY: &str = "env";
pub const API_HEADERS_KEY: &str = "API_HEADERS";

#[derive(Debug, Clone)]
pub struct McpSettings {
    path: PathBuf,
    doc: Value,
}

impl McpSettings {
    /// Read and parse the settings file. Top level must be a JSON object.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read mcp settings {:?}", path))?;
        let doc: Value = serde_json::from_str(&s)
            .with_context(|| format!("parse mcp settings {:?}", path))?;
        if !doc.is_object() {
            anyhow::bail!("mcp settings {:?}: top level must be a JSON object", path);
        }
        debug!(path = %path.display(), "mcp settings loaded");
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set `mcpServers.<server>.env.API_HEADERS`, creating `env` when absent. The server entry must exist.
    pub fn set_api_headers(&mut self, server: &str, value: &str) -> anyhow::Result<()> {
        let entry = self
            .doc
            .get_mut(SERVERS_KEY)
            .and_then(Value::as_object_mut)
            .and_then(|servers| servers.get_mut(server))
            .ok_or_else(|| anyhow::anyhow!("server '{}' not found in mcp_settings.json", server))?;
        let entry = entry
            .as_object_mut()
            .with_context(|| format!("server '{}' entry is not a JSON object", server))?;
        let env = entry
            .entry(ENV_KEY)
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .with_context(|| format!("server '{}' env is not a JSON object", server))?;
        env.insert(API_HEADERS_KEY.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    /// Pretty JSON as it will be written.
    pub fn to_pretty(&self) -> anyhow::Result<String> {
        let mut out = Vec::with_capacity(256);
        let formatter = AsciiPrettyFormatter(PrettyFormatter::with_indent(b"  "));
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.doc
            .serialize(&mut ser)
            .context("serialize mcp settings")?;
        String::from_utf8(out).context("serialized mcp settings not utf-8")
    }

    /// Serialize fully, then overwrite the file in one write.
    pub fn save(&self) -> anyhow::Result<()> {
        let body = self.to_pretty()?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("write mcp settings {:?}", self.path))?;
        debug!(path = %self.path.display(), "mcp settings written");
        Ok(())
    }
}

/// Pretty printer that writes every non-ASCII char (and DEL) as lowercase `\uXXXX` UTF-16 escapes.
struct AsciiPrettyFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiPrettyFormatter<'_> {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if c.is_ascii() && c != '\x7f' {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object_value(writer)
    }
}
