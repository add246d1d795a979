//! Call surfaces of the native engines.
//!
//! Every method mirrors one exported engine function: integer result, zero on
//! success. Text or binary replies are written into a caller-provided buffer and
//! `size` is updated with the number of bytes the engine produced. None of these
//! calls are reentrant; callers serialize access to a library for the whole
//! open→finalize span.

/// Functions shared by every engine library.
pub trait NativeLibrary: Send {
    /// Loads the configuration file and opens a session.
    fn open(&self, config_path: &str, crypt_key: &str) -> i32;
    /// Closes the session opened by [`NativeLibrary::open`].
    fn finalize(&self) -> i32;
    /// Writes the message of the last failed call into `buffer`.
    fn last_error(&self, buffer: &mut [u8], size: &mut i32) -> i32;
}

/// Payment slip engine.
pub trait BoletoLibrary: NativeLibrary {
    fn clear_list(&self) -> i32;
    fn submit_batch(&self, batch_path: &str, mode: &str) -> i32;
    /// Number of titles currently held in the engine list, not a result code.
    fn total_count(&self) -> i32;
    fn set_output_dir(&self, dir: &str, file_name: &str) -> i32;
    fn generate_output(&self, buffer: &mut [u8], size: &mut i32) -> i32;
    fn name(&self, buffer: &mut [u8], size: &mut i32) -> i32;
    fn version(&self, buffer: &mut [u8], size: &mut i32) -> i32;
    fn config_export(&self, buffer: &mut [u8], size: &mut i32) -> i32;
}

/// Postal code lookup engine.
pub trait CepLibrary: NativeLibrary {
    fn lookup(&self, cep: &str, buffer: &mut [u8], size: &mut i32) -> i32;
}

pub type BoletoLibraryBox = Box<dyn BoletoLibrary>;
pub type CepLibraryBox = Box<dyn CepLibrary>;
