//! Registration, log-in, bearer tokens and password resets.

mod log_in;
mod middleware;
mod otp;
mod password_reset;
mod register;
mod token;

pub use log_in::{LogInRequest, log_in_endpoint};
pub use middleware::{AuthUser, auth_guard};
pub use otp::{
    OTP_LIFETIME_MINUTES, PasswordReset, create_otp, create_password_reset_table, generate_otp,
    get_valid_otp, invalidate_otps, issue_otp, mark_otp_used,
};
pub use password_reset::{
    FORGOT_PASSWORD_MESSAGE, ForgotPasswordRequest, RESET_PASSWORD_MESSAGE,
    ResetPasswordRequest, forgot_password_endpoint, reset_password_endpoint,
};
pub use register::{AuthResponse, RegisterRequest, register_endpoint};
pub use token::{Claims, JwtKeys, TOKEN_DURATION, decode_token, encode_token};
