//! Commands for the Teams context.

/// Command to create a team.
#[derive(Debug, Clone)]
pub struct CreateTeam {
    /// Requested team id, canonical UUID form.
    pub id: String,
    /// Team name.
    pub name: String,
    /// Id of the administrating user.
    pub admin_id: String,
}

/// Command to join a team.
#[derive(Debug, Clone)]
pub struct JoinTeam {
    /// The team to join.
    pub team_id: String,
    /// The joining user.
    pub user_id: String,
}
