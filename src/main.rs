//! # mdi CLI
//!
//! Command-line interface for Manage Digital Ingest.
//!
//! ## Usage
//! ```bash
//! mdi match --root /Volumes/scans --csv objects.csv --column OBJ --update-csv
//! mdi derive /Volumes/scans/OBJS/*.tif --mode alma --sanitize
//! mdi ingest --root /Volumes/scans --targets-file names.txt --mode collection-builder --blob-root /srv/blobs
//! ```

mod cli;

use digital_ingest::Result;

fn main() -> Result<()> {
    cli::run()
}
