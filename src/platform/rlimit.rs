use std::io;

use super::FileLimits;

pub fn nofile() -> io::Result<FileLimits> {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: `rlim` is a valid, writable rlimit for the duration of the call.
    let ret = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(FileLimits {
        soft: to_u64(rlim.rlim_cur),
        hard: to_u64(rlim.rlim_max),
    })
}

fn to_u64(value: libc::rlim_t) -> u64 {
    if value == libc::RLIM_INFINITY {
        u64::MAX
    } else {
        value as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinity_maps_to_u64_max() {
        assert_eq!(to_u64(libc::RLIM_INFINITY), u64::MAX);
        assert_eq!(to_u64(1024), 1024);
    }
}
