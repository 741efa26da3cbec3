use crate::{db::entities::admin, error::PermissionError};

pub fn require_privilege(admin: &admin::Model) -> Result<(), PermissionError> {
    if admin.super_admin {
        Ok(())
    } else {
        Err(PermissionError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::require_privilege;
    use crate::{error::PermissionError, test_helpers::admin_model};

    #[test]
    fn only_super_admins_pass() {
        assert_eq!(require_privilege(&admin_model("root@example.com", true)), Ok(()));
        assert_eq!(
            require_privilege(&admin_model("staff@example.com", false)),
            Err(PermissionError::Forbidden)
        );
    }
}
