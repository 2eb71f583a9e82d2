//! Deployment package for the refund function
//!
//! The function is a single ES module. It answers both direct gateway
//! invocations (arguments at the top level of the event) and proxied HTTP
//! events (arguments in a JSON `body`).

use crate::error::Result;
use std::io::{Cursor, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File name inside the archive; the handler is `index.handler`
pub const ENTRY_FILE: &str = "index.mjs";

pub const REFUND_FUNCTION_SOURCE: &str = r#"console.log('Loading function');

export const handler = async (event, context) => {
    console.log('event =', JSON.stringify(event));
    console.log('context =', JSON.stringify(context));

    var response = undefined;

    if (event.body !== undefined) {
        console.log('event.body =', event.body);
        const body = JSON.parse(event.body);
        response = {"status": "Done", "amount": body.amount, "orderId": body.orderId};
    } else {
        // invoked directly by the gateway
        response = {"status": "Done", "amount": event.amount, "orderId": event.orderId};
        return response;
    }

    console.log('response =', JSON.stringify(response));
    return {"statusCode": 200, "body": JSON.stringify(response)};
};"#;

/// Zip the refund function source in memory
pub fn build_deployment_package() -> Result<Vec<u8>> {
    package_source(ENTRY_FILE, REFUND_FUNCTION_SOURCE)
}

fn package_source(file_name: &str, source: &str) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(file_name, options)?;
    zip.write_all(source.as_bytes()).map_err(ZipError::Io)?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_package_contains_handler_module() {
        let bytes = build_deployment_package().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);

        let mut entry = archive.by_name(ENTRY_FILE).unwrap();
        let mut source = String::new();
        entry.read_to_string(&mut source).unwrap();

        assert_eq!(source, REFUND_FUNCTION_SOURCE);
        assert!(source.contains("export const handler"));
    }

    #[test]
    fn test_package_is_deterministic_in_content() {
        let first = build_deployment_package().unwrap();
        let second = build_deployment_package().unwrap();
        assert!(!first.is_empty());
        // zip headers carry a modification time, so compare sizes only
        assert_eq!(first.len(), second.len());
    }
}
