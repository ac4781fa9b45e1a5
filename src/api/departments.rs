use crate::model::Department;
use crate::procedure::{Empty, Meta, Procedure};
use crate::router::{Context, Router};
use crate::store::departments;
use crate::{Module, Result};

pub struct DepartmentsModule;

impl Module for DepartmentsModule {
    fn name(&self) -> &'static str {
        "departments"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<ListDepartments>();
    }
}

pub struct ListDepartments;

impl Procedure for ListDepartments {
    fn meta() -> Meta {
        Meta::get("/api/departments")
            .summary("List departments by name")
            .tag("departments")
    }

    type Input = Empty;
    type Output = Vec<Department>;

    async fn handle(ctx: Context, _input: Empty) -> Result<Vec<Department>> {
        departments::list(ctx.require_db()?).await
    }
}
