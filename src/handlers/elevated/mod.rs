// handlers/elevated/mod.rs - Elevated handlers (ManageUsers required)
//
// Security Level: bearer JWT + live user check + ManageUsers capability
// Route Prefix: /api/admin/*
// Middleware: jwt_auth_middleware → validate_user_middleware → require_admin_middleware

pub mod users;
