pub const RESET_PASSWORD_SUBJECT: &str = "[Game Board] Your temporary password";

/// HTML body for the password-reset mail.
pub fn reset_password_email(userid: &str, temporary_password: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <style>
    body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
    .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header {{ background-color: #4A90E2; color: #fff; padding: 20px; text-align: center; }}
    .content {{ background-color: #f9f9f9; padding: 30px; border: 1px solid #ddd; }}
    .password {{ background-color: #fff; padding: 15px; border: 2px solid #4A90E2; margin: 20px 0;
                 text-align: center; font-size: 24px; font-weight: bold; letter-spacing: 2px; }}
    .notice {{ background-color: #fff3cd; border-left: 4px solid #ffc107; padding: 12px; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header"><h1>Password reset</h1></div>
    <div class="content">
      <p>Hello <strong>{userid}</strong>,</p>
      <p>A password reset was requested for your account. Use the temporary password below to sign in.</p>
      <div class="password">{temporary_password}</div>
      <div class="notice">
        <ul>
          <li>Change this password right after signing in.</li>
          <li>Never share your password with anyone.</li>
          <li>If you did not request this reset, contact support immediately.</li>
        </ul>
      </div>
    </div>
  </div>
</body>
</html>
"#,
        userid = html_escape::encode_safe(userid),
        temporary_password = temporary_password,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_contains_credential_and_user() {
        let body = reset_password_email("alice", "Ab3dEf9Z");
        assert!(body.contains("Ab3dEf9Z"));
        assert!(body.contains("<strong>alice</strong>"));
    }

    #[test]
    fn userid_is_escaped() {
        let body = reset_password_email("<script>", "x");
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }
}
