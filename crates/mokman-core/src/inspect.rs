//! Trust-material inspector.
//!
//! Renders a single signature entry for operator review: X.509 metadata
//! for certificate entries, the raw digest for hash entries, and a SHA-1
//! fingerprint for both so every entry has a uniform identity line.

use mokman_efi::Console;
use sha1::{Digest, Sha1};
use x509_parser::prelude::*;

use crate::siglist::{SignatureEntry, SignatureKind};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Whether `der` parses as an X.509 certificate.
pub fn is_valid_x509(der: &[u8]) -> bool {
    parse_x509_certificate(der).is_ok()
}

/// Renders one entry to the console.
pub fn render_entry(con: &mut dyn Console, entry: &SignatureEntry<'_>) {
    match entry.kind {
        SignatureKind::X509 => render_certificate(con, entry.data),
        SignatureKind::Sha256 => render_hash(con, entry.data),
    }
}

fn render_certificate(con: &mut dyn Console, der: &[u8]) {
    let cert = match parse_x509_certificate(der) {
        Ok((_, cert)) => cert,
        Err(_) => {
            // Show the leading bytes so the operator can recognize what the
            // stager actually put there.
            let mut word = [0u8; 4];
            for (i, b) in der.iter().take(4).enumerate() {
                word[i] = *b;
            }
            con.write(&format!(
                "  Not a valid X509 certificate: {:x}\n\n",
                u32::from_le_bytes(word)
            ));
            return;
        }
    };

    let serial = cert.raw_serial();
    if !serial.is_empty() {
        con.write("  Serial Number:\n    ");
        for (i, b) in serial.iter().enumerate() {
            if i + 1 < serial.len() {
                con.write(&format!("{b:02x}:"));
            } else {
                con.write(&format!("{b:02x}\n"));
            }
        }
    }

    con.write(&format!("  Issuer:\n    {}\n", cert.issuer()));
    con.write(&format!("  Subject:\n    {}\n", cert.subject()));
    con.write(&format!(
        "  Validity from:\n    {}\n",
        format_time(&cert.validity().not_before)
    ));
    con.write(&format!(
        "  Validity till:\n    {}\n",
        format_time(&cert.validity().not_after)
    ));

    render_fingerprint(con, der);
}

fn render_hash(con: &mut dyn Console, digest: &[u8]) {
    con.write("SHA256 hash:\n   ");
    write_hex_block(con, digest, "   ");
    render_fingerprint(con, digest);
}

fn render_fingerprint(con: &mut dyn Console, data: &[u8]) {
    let fingerprint: [u8; 20] = Sha1::digest(data).into();
    con.write("  Fingerprint (SHA1):\n    ");
    write_hex_block(con, &fingerprint, "    ");
}

/// `" %02x"` pairs, wrapped onto an indented line every ten bytes.
fn write_hex_block(con: &mut dyn Console, bytes: &[u8], indent: &str) {
    for (i, b) in bytes.iter().enumerate() {
        con.write(&format!(" {b:02x}"));
        if i % 10 == 9 {
            con.write(&format!("\n{indent}"));
        }
    }
    con.write("\n");
}

/// `"%b %d %H:%M:%S[.fff] %Y[ GMT]"`. Two-digit UTC-TIME years arrive from
/// the parser already mapped into 1950-2049; GENERALIZED-TIME fractional
/// seconds are rendered to millisecond precision when present, and the GMT
/// suffix tracks whether the parsed instant carries a UTC offset.
fn format_time(t: &ASN1Time) -> String {
    let dt = t.to_datetime();
    let month = MONTHS
        .get(dt.month() as usize - 1)
        .copied()
        .unwrap_or("???");
    let mut out = format!(
        "{} {:2} {:02}:{:02}:{:02}",
        month,
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    );
    if dt.millisecond() != 0 {
        out.push_str(&format!(".{:03}", dt.millisecond()));
    }
    out.push_str(&format!(" {}", dt.year()));
    if dt.offset().is_utc() {
        out.push_str(" GMT");
    }
    out
}
