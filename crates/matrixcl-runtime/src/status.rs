//! Runtime status codes
//!
//! Device runtimes report failures as signed integer codes. The values below
//! follow the OpenCL status table so that codes coming from a real driver can
//! be passed through unchanged. Every known code maps to a stable name and a
//! human-readable description; anything else is reported as unclassified.

use std::fmt;

/// Status code returned by a device runtime call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(pub i32);

macro_rules! status_codes {
    ($($name:ident = $value:literal => $text:literal,)+) => {
        impl StatusCode {
            $(
                #[doc = $text]
                pub const $name: StatusCode = StatusCode($value);
            )+

            /// Every code this crate knows how to classify.
            pub const KNOWN: &'static [StatusCode] = &[$(StatusCode::$name),+];

            /// Symbolic name of the code, if known.
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(stringify!($name)),)+
                    _ => None,
                }
            }

            /// Stable description of the code; `"unclassified"` for unknown codes.
            pub fn describe(self) -> &'static str {
                match self.0 {
                    $($value => $text,)+
                    _ => "unclassified",
                }
            }
        }
    };
}

status_codes! {
    SUCCESS = 0 => "Success",
    DEVICE_NOT_FOUND = -1 => "Device not found",
    DEVICE_NOT_AVAILABLE = -2 => "Device not available",
    COMPILER_NOT_AVAILABLE = -3 => "Compiler not available",
    MEM_OBJECT_ALLOCATION_FAILURE = -4 => "Memory object allocation failure",
    OUT_OF_RESOURCES = -5 => "Out of resources",
    OUT_OF_HOST_MEMORY = -6 => "Out of host memory",
    PROFILING_INFO_NOT_AVAILABLE = -7 => "Profiling information not available",
    MEM_COPY_OVERLAP = -8 => "Memory copy overlap",
    IMAGE_FORMAT_MISMATCH = -9 => "Image format mismatch",
    IMAGE_FORMAT_NOT_SUPPORTED = -10 => "Image format not supported",
    BUILD_PROGRAM_FAILURE = -11 => "Program build failure",
    MAP_FAILURE = -12 => "Map failure",
    INVALID_VALUE = -30 => "Invalid value",
    INVALID_DEVICE_TYPE = -31 => "Invalid device type",
    INVALID_PLATFORM = -32 => "Invalid platform",
    INVALID_DEVICE = -33 => "Invalid device",
    INVALID_CONTEXT = -34 => "Invalid context",
    INVALID_QUEUE_PROPERTIES = -35 => "Invalid queue properties",
    INVALID_COMMAND_QUEUE = -36 => "Invalid command queue",
    INVALID_HOST_PTR = -37 => "Invalid host pointer",
    INVALID_MEM_OBJECT = -38 => "Invalid memory object",
    INVALID_IMAGE_FORMAT_DESCRIPTOR = -39 => "Invalid image format descriptor",
    INVALID_IMAGE_SIZE = -40 => "Invalid image size",
    INVALID_SAMPLER = -41 => "Invalid sampler",
    INVALID_BINARY = -42 => "Invalid binary",
    INVALID_BUILD_OPTIONS = -43 => "Invalid build options",
    INVALID_PROGRAM = -44 => "Invalid program",
    INVALID_PROGRAM_EXECUTABLE = -45 => "Invalid program executable",
    INVALID_KERNEL_NAME = -46 => "Invalid kernel name",
    INVALID_KERNEL_DEFINITION = -47 => "Invalid kernel definition",
    INVALID_KERNEL = -48 => "Invalid kernel",
    INVALID_ARG_INDEX = -49 => "Invalid argument index",
    INVALID_ARG_VALUE = -50 => "Invalid argument value",
    INVALID_ARG_SIZE = -51 => "Invalid argument size",
    INVALID_KERNEL_ARGS = -52 => "Invalid kernel arguments",
    INVALID_WORK_DIMENSION = -53 => "Invalid work dimension",
    INVALID_WORK_GROUP_SIZE = -54 => "Invalid work group size",
    INVALID_WORK_ITEM_SIZE = -55 => "Invalid work item size",
    INVALID_GLOBAL_OFFSET = -56 => "Invalid global offset",
    INVALID_EVENT_WAIT_LIST = -57 => "Invalid event wait list",
    INVALID_EVENT = -58 => "Invalid event",
    INVALID_OPERATION = -59 => "Invalid operation",
    INVALID_GL_OBJECT = -60 => "Invalid OpenGL object",
    INVALID_BUFFER_SIZE = -61 => "Invalid buffer size",
    INVALID_MIP_LEVEL = -62 => "Invalid mip-map level",
}

impl StatusCode {
    /// Raw integer value
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Whether the code reports success
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Whether the code is part of the known table
    pub fn is_known(self) -> bool {
        self.name().is_some()
    }
}

impl From<i32> for StatusCode {
    fn from(code: i32) -> Self {
        StatusCode(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.describe(), self.0)
    }
}
