//! Unix pseudo-terminal endpoint for the serial card.
//!
//! Owns the pty master; the slave device path is reported through
//! `name()` so an operator can attach a terminal program to the
//! emulated UART. All the raw libc plumbing of the crate lives here.

use std::ffi::CStr;
use std::io;

use s100_core::device::endpoint::{Parity, SerialEndpoint};

const DEFAULT_BAUD_RATE: u32 = 300;
const DEFAULT_DATA_BITS: u8 = 8;
const DEFAULT_STOP_BITS: u8 = 1;

pub struct UnixPty {
    master_fd: libc::c_int,
    slave_name: String,
}

impl UnixPty {
    /// Allocate and unlock a pty pair, leaving the master in raw mode at
    /// the default line settings.
    pub fn open() -> io::Result<Self> {
        // SAFETY: plain fd-returning libc calls, no pointer arguments.
        let fd = unsafe { libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: fd was just obtained from posix_openpt.
        if unsafe { libc::grantpt(fd) } < 0 || unsafe { libc::unlockpt(fd) } < 0 {
            let err = io::Error::last_os_error();
            // SAFETY: fd is owned here and not yet shared.
            unsafe { libc::close(fd) };
            return Err(err);
        }

        let mut buf = [0 as libc::c_char; 128];
        // SAFETY: buf outlives the call and its length is passed along.
        if unsafe { libc::ptsname_r(fd, buf.as_mut_ptr(), buf.len()) } != 0 {
            let err = io::Error::last_os_error();
            // SAFETY: fd is owned here and not yet shared.
            unsafe { libc::close(fd) };
            return Err(err);
        }
        // SAFETY: ptsname_r NUL-terminates on success.
        let slave_name = unsafe { CStr::from_ptr(buf.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        let mut pty = Self {
            master_fd: fd,
            slave_name,
        };
        pty.set_baud_rate(DEFAULT_BAUD_RATE)?;
        pty.setup(DEFAULT_DATA_BITS, Parity::None, DEFAULT_STOP_BITS)?;
        Ok(pty)
    }

    fn tcgetattr(&self) -> io::Result<libc::termios> {
        // SAFETY: termios is a plain-data struct; zeroed is a valid init.
        let mut tty: libc::termios = unsafe { std::mem::zeroed() };
        // SAFETY: fd is open, tty points at writable memory.
        if unsafe { libc::tcgetattr(self.master_fd, &mut tty) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(tty)
    }

    fn tcsetattr(&self, tty: &libc::termios) -> io::Result<()> {
        // SAFETY: fd is open, tty is a valid termios.
        if unsafe { libc::tcsetattr(self.master_fd, libc::TCSANOW, tty) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

/// The termios speed constant for a numeric baud rate. Only the
/// standard rates exist; anything else is rejected.
fn speed_for(baud: u32) -> io::Result<libc::speed_t> {
    let speed = match baud {
        50 => libc::B50,
        75 => libc::B75,
        110 => libc::B110,
        134 => libc::B134,
        150 => libc::B150,
        200 => libc::B200,
        300 => libc::B300,
        600 => libc::B600,
        1200 => libc::B1200,
        1800 => libc::B1800,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported baud rate {baud}"),
            ))
        }
    };
    Ok(speed)
}

impl SerialEndpoint for UnixPty {
    fn name(&self) -> &str {
        if self.master_fd < 0 {
            return "";
        }
        &self.slave_name
    }

    fn poll(&mut self) -> io::Result<bool> {
        let mut fds = libc::pollfd {
            fd: self.master_fd,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: fds outlives the call; nfds matches.
        if unsafe { libc::poll(&mut fds, 1, 0) } < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(err);
            }
        }
        Ok(fds.revents & libc::POLLIN != 0)
    }

    fn getch(&mut self) -> io::Result<u8> {
        let mut byte = 0u8;
        // SAFETY: byte outlives the call; length 1 matches the buffer.
        let n = unsafe { libc::read(self.master_fd, (&mut byte as *mut u8).cast(), 1) };
        if n != 1 {
            return Err(io::Error::last_os_error());
        }
        Ok(byte)
    }

    fn putch(&mut self, byte: u8) -> io::Result<()> {
        loop {
            // SAFETY: byte outlives the call; length 1 matches the buffer.
            let n = unsafe { libc::write(self.master_fd, (&byte as *const u8).cast(), 1) };
            if n == 1 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn send_break(&mut self) -> io::Result<()> {
        // SAFETY: fd is open; duration 0 selects the default break length.
        if unsafe { libc::tcsendbreak(self.master_fd, 0) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn setup(&mut self, data_bits: u8, parity: Parity, stop_bits: u8) -> io::Result<()> {
        let mut tty = self.tcgetattr()?;
        // SAFETY: cfmakeraw only mutates the passed struct.
        unsafe { libc::cfmakeraw(&mut tty) };

        tty.c_cflag &= !libc::CSIZE;
        tty.c_cflag |= match data_bits {
            5 => libc::CS5,
            6 => libc::CS6,
            7 => libc::CS7,
            8 => libc::CS8,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unsupported data bits {data_bits}"),
                ))
            }
        };

        match parity {
            Parity::None => tty.c_cflag &= !libc::PARENB,
            Parity::Even => {
                tty.c_cflag |= libc::PARENB;
                tty.c_cflag &= !libc::PARODD;
            }
            Parity::Odd => {
                tty.c_cflag |= libc::PARENB;
                tty.c_cflag |= libc::PARODD;
            }
        }

        match stop_bits {
            1 => tty.c_cflag &= !libc::CSTOPB,
            2 => tty.c_cflag |= libc::CSTOPB,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unsupported stop bits {stop_bits}"),
                ))
            }
        }

        tty.c_cflag |= libc::CLOCAL | libc::CREAD;
        tty.c_cc[libc::VMIN] = 1;
        tty.c_cc[libc::VTIME] = 0;

        self.tcsetattr(&tty)
    }

    fn set_baud_rate(&mut self, baud: u32) -> io::Result<()> {
        let speed = speed_for(baud)?;
        let mut tty = self.tcgetattr()?;
        // SAFETY: cfset*speed only mutate the passed struct.
        unsafe {
            libc::cfsetispeed(&mut tty, speed);
            libc::cfsetospeed(&mut tty, speed);
        }
        self.tcsetattr(&tty)
    }

    fn close(&mut self) {
        if self.master_fd >= 0 {
            // SAFETY: fd is owned by this struct and closed exactly once.
            unsafe { libc::close(self.master_fd) };
            self.master_fd = -1;
        }
    }
}

impl Drop for UnixPty {
    fn drop(&mut self) {
        self.close();
    }
}
