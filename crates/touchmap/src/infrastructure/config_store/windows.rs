//! Windows configuration store via the registry (`RegOpenKeyExW` and friends).
//!
//! Paths are relative to `HKEY_LOCAL_MACHINE`.  Each operation opens the key
//! with the narrowest access it needs and closes it before returning, so a
//! standard user can list and read while only `set_value` needs elevation.
//!
//! Status codes map onto [`StoreError`]:
//!
//! | Win32 status            | StoreError          |
//! |-------------------------|---------------------|
//! | `ERROR_FILE_NOT_FOUND`  | `StoreUnavailable`  |
//! | `ERROR_ACCESS_DENIED`   | `AccessDenied`      |
//! | anything else           | `Os`                |
//!
//! Value names that are not valid UTF-16 are left out of `list_keys`, since
//! they could not be passed back to `set_value`.  Values that are not
//! `REG_SZ` or `REG_EXPAND_SZ` read as `NotAString`.

use windows::core::{HSTRING, PCWSTR, PWSTR};
use windows::Win32::Foundation::{
    ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS, WIN32_ERROR,
};
use windows::Win32::System::Registry::{
    RegCloseKey, RegEnumValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY,
    HKEY_LOCAL_MACHINE, KEY_QUERY_VALUE, KEY_SET_VALUE, REG_EXPAND_SZ, REG_SAM_FLAGS, REG_SZ,
    REG_VALUE_TYPE,
};
use tracing::debug;

use crate::application::mapping_store::{ConfigStore, StoreError};

/// Maximum registry value name length in UTF-16 units, plus terminator.
const MAX_VALUE_NAME: usize = 16_384;

/// [`ConfigStore`] over `HKEY_LOCAL_MACHINE`.
pub struct RegistryConfigStore;

impl RegistryConfigStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RegistryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

/// An open registry key, closed on drop.
struct OpenKey {
    hkey: HKEY,
    path: String,
}

impl OpenKey {
    fn open(path: &str, access: REG_SAM_FLAGS) -> Result<Self, StoreError> {
        let subkey = HSTRING::from(path);
        let mut hkey = HKEY::default();
        // SAFETY: `subkey` is a valid NUL-terminated wide string that outlives
        // the call, and `hkey` is a valid out-pointer.
        let status = unsafe {
            RegOpenKeyExW(
                HKEY_LOCAL_MACHINE,
                PCWSTR(subkey.as_ptr()),
                0,
                access,
                &mut hkey,
            )
        };
        check(status, path)?;
        Ok(Self {
            hkey,
            path: path.to_string(),
        })
    }

    /// Returns the type and raw bytes of `name`, or `None` if it is absent.
    fn query(&self, name: &str) -> Result<Option<(REG_VALUE_TYPE, Vec<u8>)>, StoreError> {
        let wide = HSTRING::from(name);
        let mut value_type = REG_VALUE_TYPE::default();
        let mut size = 0u32;
        // SAFETY: size-only query; no data buffer is passed.
        let status = unsafe {
            RegQueryValueExW(
                self.hkey,
                PCWSTR(wide.as_ptr()),
                None,
                Some(&mut value_type),
                None,
                Some(&mut size),
            )
        };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        check(status, &self.path)?;

        let mut data = vec![0u8; size as usize];
        // SAFETY: `data` holds exactly `size` bytes as reported above.
        let status = unsafe {
            RegQueryValueExW(
                self.hkey,
                PCWSTR(wide.as_ptr()),
                None,
                Some(&mut value_type),
                Some(data.as_mut_ptr()),
                Some(&mut size),
            )
        };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        check(status, &self.path)?;
        data.truncate(size as usize);
        Ok(Some((value_type, data)))
    }
}

impl Drop for OpenKey {
    fn drop(&mut self) {
        // SAFETY: `hkey` was opened by `RegOpenKeyExW` and is closed once.
        unsafe {
            let _ = RegCloseKey(self.hkey);
        }
    }
}

impl ConfigStore for RegistryConfigStore {
    fn list_keys(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let key = OpenKey::open(path, KEY_QUERY_VALUE)?;
        let mut names = Vec::new();
        let mut buf = vec![0u16; MAX_VALUE_NAME];

        for index in 0u32.. {
            let mut len = buf.len() as u32;
            // SAFETY: `buf` is writable for `len` UTF-16 units.
            let status = unsafe {
                RegEnumValueW(
                    key.hkey,
                    index,
                    PWSTR(buf.as_mut_ptr()),
                    &mut len,
                    None,
                    None,
                    None,
                    None,
                )
            };
            if status == ERROR_NO_MORE_ITEMS {
                break;
            }
            check(status, path)?;
            match decode_name(&buf[..len as usize]) {
                Some(name) => names.push(name),
                None => debug!(index, path, "skipping value name that is not valid UTF-16"),
            }
        }

        Ok(names)
    }

    fn get_value(&self, path: &str, key: &str) -> Result<Option<String>, StoreError> {
        let open = OpenKey::open(path, KEY_QUERY_VALUE)?;
        match open.query(key)? {
            Some((value_type, data)) if value_type == REG_SZ || value_type == REG_EXPAND_SZ => {
                Ok(Some(decode_wide(&data)))
            }
            Some((value_type, _)) => {
                debug!(key, path, value_type = value_type.0, "non-string registry value");
                Err(StoreError::NotAString {
                    key: key.to_string(),
                })
            }
            None => Ok(None),
        }
    }

    fn set_value(&self, path: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let open = OpenKey::open(path, KEY_QUERY_VALUE | KEY_SET_VALUE)?;
        if open.query(key)?.is_none() {
            return Err(StoreError::KeyNotFound {
                key: key.to_string(),
            });
        }

        let name = HSTRING::from(key);
        let data = encode_wide(value);
        // SAFETY: `name` is NUL-terminated and `data` is a complete REG_SZ payload.
        let status = unsafe {
            RegSetValueExW(open.hkey, PCWSTR(name.as_ptr()), 0, REG_SZ, Some(data.as_slice()))
        };
        check(status, path)
    }
}

fn check(status: WIN32_ERROR, path: &str) -> Result<(), StoreError> {
    match status {
        s if s == ERROR_SUCCESS => Ok(()),
        s if s == ERROR_FILE_NOT_FOUND => Err(StoreError::StoreUnavailable {
            path: path.to_string(),
        }),
        s if s == ERROR_ACCESS_DENIED => Err(StoreError::AccessDenied {
            path: path.to_string(),
        }),
        s => Err(StoreError::Os(format!("{path}: Win32 error {}", s.0))),
    }
}

/// UTF-16LE bytes with a trailing NUL, as `REG_SZ` expects.
fn encode_wide(value: &str) -> Vec<u8> {
    value
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

/// A value name, or `None` when it contains unpaired surrogates.
fn decode_name(units: &[u16]) -> Option<String> {
    String::from_utf16(units).ok()
}

fn decode_wide(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    String::from_utf16_lossy(&units[..end])
}
