//! 内部日志宏：关闭 `logging` 特性时整体编译为空

macro_rules! uap_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::trace!($($arg)*);
        }
    };
}

macro_rules! uap_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::debug!($($arg)*);
        }
    };
}

macro_rules! uap_info {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::info!($($arg)*);
        }
    };
}

macro_rules! uap_warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::warn!($($arg)*);
        }
    };
}

pub(crate) use {uap_debug, uap_info, uap_trace, uap_warn};
