//! Protocol messages for host-editor communication
//!
//! Uses a simple length-prefixed JSON protocol:
//! - 4 bytes (little-endian u32): message length
//! - N bytes: JSON-encoded message

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;

/// Request from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Build the index for a directory (full rebuild)
    Index { directory: PathBuf },

    /// Query a directory's index, loading it on demand
    Search { directory: PathBuf, query: String },

    /// Ping for connection testing
    Ping,

    /// Graceful shutdown request
    Shutdown,
}

/// Response from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Indexing completed
    Indexed { directory: PathBuf },

    /// Search results
    Search(SearchData),

    /// Pong response
    Pong,

    /// Shutdown acknowledged
    ShuttingDown,

    /// Error response
    Error { message: String },
}

/// Serializable search outcome (mirrors ResultSet without the lazy
/// match collections)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchData {
    pub tokens: Vec<String>,
    pub matches: Vec<FileMatchData>,
    pub files_considered: usize,
    pub total_files: usize,
}

/// One ranked file in a search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMatchData {
    pub path: String,
}

/// Write a message to a stream with length prefix
pub fn write_message<W: Write>(writer: &mut W, msg: &impl Serialize) -> std::io::Result<()> {
    let json = serde_json::to_vec(msg)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let len = json.len() as u32;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()?;

    Ok(())
}

/// Read a message from a stream with length prefix
pub fn read_message<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> std::io::Result<T> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    // Sanity check: don't allocate more than 100MB
    if len > 100 * 1024 * 1024 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Message too large",
        ));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;

    serde_json::from_slice(&buf).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_roundtrip_request() {
        let req = Request::Search {
            directory: PathBuf::from("/home/user/project"),
            query: "paged list".to_string(),
        };

        let mut buf = Vec::new();
        write_message(&mut buf, &req).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded: Request = read_message(&mut cursor).unwrap();

        match decoded {
            Request::Search { directory, query } => {
                assert_eq!(directory, PathBuf::from("/home/user/project"));
                assert_eq!(query, "paged list");
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_roundtrip_response() {
        let resp = Response::Search(SearchData {
            tokens: vec!["paged".to_string(), "list".to_string()],
            matches: vec![FileMatchData {
                path: "src/storage/paged_list.rs".to_string(),
            }],
            files_considered: 3,
            total_files: 120,
        });

        let mut buf = Vec::new();
        write_message(&mut buf, &resp).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded: Response = read_message(&mut cursor).unwrap();

        match decoded {
            Response::Search(data) => {
                assert_eq!(data.matches.len(), 1);
                assert_eq!(data.files_considered, 3);
                assert_eq!(data.total_files, 120);
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_oversized_message_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(200u32 * 1024 * 1024).to_le_bytes());

        let mut cursor = Cursor::new(buf);
        let result: std::io::Result<Request> = read_message(&mut cursor);
        assert!(result.is_err());
    }
}
