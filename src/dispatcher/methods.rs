//! One registration method per wrapped filesystem operation.

use super::core::Router;
use super::handler::{Handled, Next, Request, Response};
use crate::error::DispatchError;

macro_rules! operation_methods {
    ($($method:ident => $name:literal),+ $(,)?) => {
        /// Operation names that have a registration method on [`Router`].
        pub const SUPPORTED_OPERATIONS: &[&str] = &[$($name),+];

        impl Router {
            $(
                #[doc = concat!("Bind `handler` to `template` for `", $name, "`.")]
                ///
                /// # Errors
                ///
                /// See [`Router::register`].
                pub fn $method<F, R>(&self, template: &str, handler: F) -> Result<(), DispatchError>
                where
                    F: Fn(Request, Response, Next) -> R + Send + Sync + 'static,
                    R: Into<Handled>,
                {
                    self.register($name, template, handler)
                }
            )+
        }
    };
}

operation_methods! {
    access => "access",
    access_sync => "accessSync",
    append_file => "appendFile",
    append_file_sync => "appendFileSync",
    chmod => "chmod",
    chmod_sync => "chmodSync",
    chown => "chown",
    chown_sync => "chownSync",
    create_read_stream => "createReadStream",
    create_write_stream => "createWriteStream",
    exists_sync => "existsSync",
    lchmod => "lchmod",
    lchmod_sync => "lchmodSync",
    lchown => "lchown",
    lchown_sync => "lchownSync",
    lstat => "lstat",
    lstat_sync => "lstatSync",
    mkdir => "mkdir",
    mkdir_sync => "mkdirSync",
    open => "open",
    opendir => "opendir",
    opendir_sync => "opendirSync",
    open_sync => "openSync",
    readdir => "readdir",
    readdir_sync => "readdirSync",
    read_file => "readFile",
    read_file_sync => "readFileSync",
    readlink => "readlink",
    readlink_sync => "readlinkSync",
    realpath => "realpath",
    realpath_sync => "realpathSync",
    rmdir => "rmdir",
    rmdir_sync => "rmdirSync",
    stat => "stat",
    stat_sync => "statSync",
    truncate => "truncate",
    truncate_sync => "truncateSync",
    unlink => "unlink",
    unlink_sync => "unlinkSync",
    utimes => "utimes",
    utimes_sync => "utimesSync",
}
