/*!
# Delivery Verification Backend

A small web backend that lets a delivery-confirmation client look up and
update customer rows in a shared spreadsheet, and store proof-of-delivery
videos in a cloud file store.

## Overview

The spreadsheet acts as the database. It has no schema: columns are found by
scanning a fixed header row, and a customer is identified by the value in the
"Request ID" column (the CID). Every request re-reads what it needs; nothing
is cached.

## Architecture

### Gateways
- **SheetGateway** - range reads and writes in A1 notation (`B5:FA`, `BB12:CA12`)
- **FileStore** - upload, grant public read access, derive a shareable link
- Hosted implementations talk to the Sheets v4 and Drive v3 HTTP APIs;
  in-memory implementations back the tests

### Core
- **Row Resolver** ([`resolver::CustomerSheet`]) - finds the CID's row and pairs
  the sent and received quantity blocks into an item list
- **Delivery Updater** ([`delivery::DeliveryUpdater`]) - overwrites the received
  block of the CID's row
- **Video Link Updater** ([`video::VideoLinkUpdater`]) - writes the proof link
  into the column headed "Video Link"
- **Proof Uploader** ([`proof::ProofUploader`]) - upload, publish, link

### HTTP layer (feature `web`)
- `GET  /customer-details/?cid=` - customer record, or placeholders when unknown
- `POST /confirm-delivery/` - `{cid, received: {item: qty}}`
- `POST /upload-proof-video/` - multipart `{cid, file}`

All routes are also served under `/api/`.

## Worksheet layout

| Block | Columns | Rows |
|---|---|---|
| Header row | `B:FA` | 3 |
| Primary | `B:FA` | 5 onwards |
| Sent quantities | `W:AV` | 5 onwards |
| Received quantities | `BB:CA` | 5 onwards |

Row N of the primary block corresponds to row N of both quantity blocks.
*/

pub mod a1;
pub mod delivery;
pub mod error;
pub mod gateway;
pub mod layout;
pub mod lookup;
pub mod model;
pub mod proof;
pub mod resolver;
pub mod video;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod retry;

pub use delivery::DeliveryUpdater;
pub use error::{DeliveryError, GatewayError, Result};
pub use layout::SheetLayout;
pub use model::{CustomerRecord, Item};
pub use proof::ProofUploader;
pub use resolver::CustomerSheet;
pub use video::VideoLinkUpdater;
