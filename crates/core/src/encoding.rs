//! Decoding of console output.
//!
//! Windows utilities such as `ipconfig` and `chkdsk` write localized text in
//! the OEM code page rather than UTF-8. The encoding is resolved once per
//! process: the OEM code page if the OS accepts it, then Windows-1252, then
//! UTF-8.

use std::sync::OnceLock;

const WINDOWS_1252: u32 = 1252;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleEncoding {
    /// A single-byte or multibyte code page known to the OS.
    CodePage(u32),
    Utf8,
}

impl ConsoleEncoding {
    /// The encoding to use for every captured process stream.
    pub fn preferred() -> Self {
        static PREFERRED: OnceLock<ConsoleEncoding> = OnceLock::new();
        *PREFERRED.get_or_init(|| {
            let encoding = Self::resolve(platform::oem_code_page(), platform::is_valid_code_page);
            log::debug!("Console output encoding: {:?}", encoding);
            encoding
        })
    }

    /// Picks the first usable candidate: OEM code page, Windows-1252, UTF-8.
    pub fn resolve(oem_code_page: Option<u32>, is_valid: impl Fn(u32) -> bool) -> Self {
        oem_code_page
            .into_iter()
            .chain(std::iter::once(WINDOWS_1252))
            .find(|&code_page| is_valid(code_page))
            .map_or(Self::Utf8, Self::CodePage)
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        if bytes.is_empty() {
            return String::new();
        }

        match self {
            Self::CodePage(code_page) => platform::decode_code_page(*code_page, bytes)
                .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned()),
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

#[cfg(windows)]
mod platform {
    use windows_sys::Win32::Globalization::{GetOEMCP, IsValidCodePage, MultiByteToWideChar};

    pub fn oem_code_page() -> Option<u32> {
        // SAFETY: takes no arguments and only reads process state.
        let code_page = unsafe { GetOEMCP() };
        (code_page != 0).then_some(code_page)
    }

    pub fn is_valid_code_page(code_page: u32) -> bool {
        // SAFETY: takes a plain integer.
        unsafe { IsValidCodePage(code_page) != 0 }
    }

    pub fn decode_code_page(code_page: u32, bytes: &[u8]) -> Option<String> {
        let input_len = i32::try_from(bytes.len()).ok()?;

        // SAFETY: the input pointer and length describe `bytes`; a null output
        // buffer asks only for the required length.
        let wide_len = unsafe {
            MultiByteToWideChar(
                code_page,
                0,
                bytes.as_ptr(),
                input_len,
                std::ptr::null_mut(),
                0,
            )
        };
        if wide_len <= 0 {
            return None;
        }

        let mut wide = vec![0u16; usize::try_from(wide_len).ok()?];
        // SAFETY: `wide` holds exactly `wide_len` elements.
        let written = unsafe {
            MultiByteToWideChar(
                code_page,
                0,
                bytes.as_ptr(),
                input_len,
                wide.as_mut_ptr(),
                wide_len,
            )
        };
        if written <= 0 {
            return None;
        }

        wide.truncate(usize::try_from(written).ok()?);
        Some(String::from_utf16_lossy(&wide))
    }
}

#[cfg(not(windows))]
mod platform {
    pub fn oem_code_page() -> Option<u32> {
        None
    }

    pub fn is_valid_code_page(_code_page: u32) -> bool {
        false
    }

    pub fn decode_code_page(_code_page: u32, _bytes: &[u8]) -> Option<String> {
        None
    }
}
