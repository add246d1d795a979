//! Bindings to the ACBr shared libraries.
//!
//! Symbols are resolved once when the library is loaded; the [`Library`] is
//! kept alongside the function pointers so they stay valid for as long as the
//! binding lives, which in practice is the whole process.

use crate::domain::ports::{BoletoLibrary, CepLibrary, NativeLibrary};
use crate::error::{GatewayError, Result};
use libloading::Library;
use parking_lot::Mutex;
use std::ffi::{CString, c_char, c_int};
use std::path::Path;

/// Returned when an argument cannot cross the C boundary (interior NUL).
pub const INVALID_ARGUMENT: i32 = -100;

type OpenFn = unsafe extern "C" fn(*const c_char, *const c_char) -> c_int;
type UnitFn = unsafe extern "C" fn() -> c_int;
type BufferFn = unsafe extern "C" fn(*mut c_char, *mut c_int) -> c_int;
type TwoStringFn = unsafe extern "C" fn(*const c_char, *const c_char) -> c_int;
type LookupFn = unsafe extern "C" fn(*const c_char, *mut c_char, *mut c_int) -> c_int;

fn load(path: &Path) -> Result<Library> {
    // SAFETY: loading runs the library initializers; the engine libraries are
    // trusted installation artifacts.
    unsafe { Library::new(path) }.map_err(|err| GatewayError::LibraryLoad {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

fn symbol<T: Copy>(library: &Library, path: &Path, name: &str) -> Result<T> {
    // SAFETY: every alias above matches the exported C signature.
    unsafe { library.get::<T>(name.as_bytes()) }
        .map(|symbol| *symbol)
        .map_err(|err| GatewayError::LibraryLoad {
            path: path.to_path_buf(),
            message: format!("{name}: {err}"),
        })
}

/// Functions every ACBr library exports under its own prefix.
struct Core {
    open: OpenFn,
    finalize: UnitFn,
    last_error: BufferFn,
    /// Argument errors detected before reaching the engine.
    local_error: Mutex<Option<String>>,
}

impl Core {
    fn load(library: &Library, path: &Path, prefix: &str) -> Result<Self> {
        Ok(Self {
            open: symbol(library, path, &format!("{prefix}_Inicializar"))?,
            finalize: symbol(library, path, &format!("{prefix}_Finalizar"))?,
            last_error: symbol(library, path, &format!("{prefix}_UltimoRetorno"))?,
            local_error: Mutex::new(None),
        })
    }

    fn c_string(&self, value: &str) -> Option<CString> {
        match CString::new(value) {
            Ok(value) => Some(value),
            Err(_) => {
                *self.local_error.lock() = Some(format!("argument contains a NUL byte: {value:?}"));
                None
            }
        }
    }

    fn open(&self, config_path: &str, crypt_key: &str) -> i32 {
        let (Some(config), Some(key)) = (self.c_string(config_path), self.c_string(crypt_key))
        else {
            return INVALID_ARGUMENT;
        };
        *self.local_error.lock() = None;
        // SAFETY: both pointers are valid NUL-terminated strings for the call.
        unsafe { (self.open)(config.as_ptr(), key.as_ptr()) }
    }

    fn finalize(&self) -> i32 {
        // SAFETY: no arguments.
        unsafe { (self.finalize)() }
    }

    fn last_error(&self, buffer: &mut [u8], size: &mut i32) -> i32 {
        if let Some(message) = self.local_error.lock().take() {
            let written = message.len().min(buffer.len());
            buffer[..written].copy_from_slice(&message.as_bytes()[..written]);
            *size = i32::try_from(message.len()).unwrap_or(i32::MAX);
            return 0;
        }
        call_buffer(self.last_error, buffer, size)
    }
}

fn call_buffer(function: BufferFn, buffer: &mut [u8], size: &mut i32) -> i32 {
    // SAFETY: `size` never exceeds the buffer length, the engine writes at most
    // `size` bytes and stores the produced length back into `size`.
    *size = (*size).min(i32::try_from(buffer.len()).unwrap_or(i32::MAX));
    unsafe { function(buffer.as_mut_ptr().cast::<c_char>(), size as *mut c_int) }
}

/// `libacbrboleto64` binding.
pub struct AcbrBoletoLibrary {
    core: Core,
    clear_list: UnitFn,
    submit_batch: TwoStringFn,
    total_count: UnitFn,
    set_output_dir: TwoStringFn,
    generate_output: BufferFn,
    name: BufferFn,
    version: BufferFn,
    config_export: BufferFn,
    _library: Library,
}

impl AcbrBoletoLibrary {
    pub fn load(path: &Path) -> Result<Self> {
        let library = load(path)?;
        Ok(Self {
            core: Core::load(&library, path, "Boleto")?,
            clear_list: symbol(&library, path, "Boleto_LimparLista")?,
            submit_batch: symbol(&library, path, "Boleto_IncluirTitulos")?,
            total_count: symbol(&library, path, "Boleto_TotalTitulosLista")?,
            set_output_dir: symbol(&library, path, "Boleto_SetDiretorioArquivo")?,
            generate_output: symbol(&library, path, "Boleto_SalvarPDF")?,
            name: symbol(&library, path, "Boleto_Nome")?,
            version: symbol(&library, path, "Boleto_Versao")?,
            config_export: symbol(&library, path, "Boleto_ConfigExportar")?,
            _library: library,
        })
    }

    fn two_strings(&self, function: TwoStringFn, first: &str, second: &str) -> i32 {
        let (Some(first), Some(second)) = (self.core.c_string(first), self.core.c_string(second))
        else {
            return INVALID_ARGUMENT;
        };
        // SAFETY: both pointers are valid NUL-terminated strings for the call.
        unsafe { function(first.as_ptr(), second.as_ptr()) }
    }
}

impl NativeLibrary for AcbrBoletoLibrary {
    fn open(&self, config_path: &str, crypt_key: &str) -> i32 {
        self.core.open(config_path, crypt_key)
    }

    fn finalize(&self) -> i32 {
        self.core.finalize()
    }

    fn last_error(&self, buffer: &mut [u8], size: &mut i32) -> i32 {
        self.core.last_error(buffer, size)
    }
}

impl BoletoLibrary for AcbrBoletoLibrary {
    fn clear_list(&self) -> i32 {
        // SAFETY: no arguments.
        unsafe { (self.clear_list)() }
    }

    fn submit_batch(&self, batch_path: &str, mode: &str) -> i32 {
        self.two_strings(self.submit_batch, batch_path, mode)
    }

    fn total_count(&self) -> i32 {
        // SAFETY: no arguments.
        unsafe { (self.total_count)() }
    }

    fn set_output_dir(&self, dir: &str, file_name: &str) -> i32 {
        self.two_strings(self.set_output_dir, dir, file_name)
    }

    fn generate_output(&self, buffer: &mut [u8], size: &mut i32) -> i32 {
        call_buffer(self.generate_output, buffer, size)
    }

    fn name(&self, buffer: &mut [u8], size: &mut i32) -> i32 {
        call_buffer(self.name, buffer, size)
    }

    fn version(&self, buffer: &mut [u8], size: &mut i32) -> i32 {
        call_buffer(self.version, buffer, size)
    }

    fn config_export(&self, buffer: &mut [u8], size: &mut i32) -> i32 {
        call_buffer(self.config_export, buffer, size)
    }
}

/// `libacbrcep64` binding.
pub struct AcbrCepLibrary {
    core: Core,
    lookup: LookupFn,
    _library: Library,
}

impl AcbrCepLibrary {
    pub fn load(path: &Path) -> Result<Self> {
        let library = load(path)?;
        Ok(Self {
            core: Core::load(&library, path, "CEP")?,
            lookup: symbol(&library, path, "CEP_BuscarPorCEP")?,
            _library: library,
        })
    }
}

impl NativeLibrary for AcbrCepLibrary {
    fn open(&self, config_path: &str, crypt_key: &str) -> i32 {
        self.core.open(config_path, crypt_key)
    }

    fn finalize(&self) -> i32 {
        self.core.finalize()
    }

    fn last_error(&self, buffer: &mut [u8], size: &mut i32) -> i32 {
        self.core.last_error(buffer, size)
    }
}

impl CepLibrary for AcbrCepLibrary {
    fn lookup(&self, cep: &str, buffer: &mut [u8], size: &mut i32) -> i32 {
        let Some(cep) = self.core.c_string(cep) else {
            return INVALID_ARGUMENT;
        };
        *size = (*size).min(i32::try_from(buffer.len()).unwrap_or(i32::MAX));
        // SAFETY: `cep` is NUL-terminated and the buffer holds at least `size` bytes.
        unsafe {
            (self.lookup)(
                cep.as_ptr(),
                buffer.as_mut_ptr().cast::<c_char>(),
                size as *mut c_int,
            )
        }
    }
}
