// SPDX-License-Identifier: Apache-2.0

//! Satellite-imagery collaborator: builds static-map URLs for served
//! addresses and fixed placeholders for everything else.

pub const DEFAULT_IMAGE_WIDTH: u32 = 800;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 400;
pub const DEFAULT_IMAGE_ZOOM: u32 = 18;

/// Keys left at the sample value in a copied env file count as unset.
const KEY_PLACEHOLDER: &str = "your-google-maps-api-key";

/// Satellite image URL for an address, or the unavailable placeholder when
/// no usable API key is configured.
#[must_use]
pub fn satellite_image_url(
    address: &str,
    api_key: Option<&str>,
    width: u32,
    height: u32,
    zoom: u32,
) -> String {
    match api_key {
        Some(key) if !key.is_empty() && key != KEY_PLACEHOLDER => {
            format!(
                "https://maps.googleapis.com/maps/api/staticmap?center={}&zoom={zoom}&size={width}x{height}&maptype=satellite&key={key}",
                encode_component(address)
            )
        }
        _ => unavailable_placeholder(width, height),
    }
}

#[must_use]
pub fn unavailable_placeholder(width: u32, height: u32) -> String {
    format!("https://via.placeholder.com/{width}x{height}?text=Satellite+Image+Unavailable")
}

/// Placeholder stored for submissions outside the served region.
#[must_use]
pub fn out_of_region_placeholder() -> String {
    format!(
        "https://via.placeholder.com/{DEFAULT_IMAGE_WIDTH}x{DEFAULT_IMAGE_HEIGHT}?text=Service+Only+Available+in+Massachusetts"
    )
}

/// Placeholder shown while a mirror-backed render waits on the server.
#[must_use]
pub fn pending_placeholder() -> String {
    format!(
        "https://via.placeholder.com/{DEFAULT_IMAGE_WIDTH}x{DEFAULT_IMAGE_HEIGHT}?text=Property+Image+Loading"
    )
}

/// Maps-search link for a resolved record.
#[must_use]
pub fn maps_search_url(address: &str) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={}",
        encode_component(address)
    )
}

// Same escape set a browser's encodeURIComponent uses.
fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => {
                out.push('%');
                for nibble in [byte >> 4, byte & 0x0f] {
                    out.push(
                        char::from_digit(u32::from(nibble), 16)
                            .map(|c| c.to_ascii_uppercase())
                            .unwrap_or('0'),
                    );
                }
            }
        }
    }
    out
}
