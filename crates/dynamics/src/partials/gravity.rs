use nalgebra::{DMatrix, Matrix3, Vector3};
use skein_core::ParameterId;

use crate::{
    BodyId, Environment, Error, StateReference,
    models::PointMassGravity,
    partials::StateDerivativePartial,
};

impl PointMassGravity {
    /// Gradient of the acceleration with respect to the relative position,
    /// `−μ/r³ (I − 3 r̂ r̂ᵀ)`.
    fn position_gradient(&self, env: &Environment<'_>, body: BodyId) -> Result<Matrix3<f64>, Error> {
        let mu = env.gravitational_parameter(self.exerting())?;
        let r = self.relative_position(env, body)?;
        let distance = r.norm();
        let unit = r / distance;
        Ok(-mu / distance.powi(3) * (Matrix3::identity() - 3.0 * unit * unit.transpose()))
    }
}

impl StateDerivativePartial for PointMassGravity {
    fn wrt_state(
        &self,
        env: &Environment<'_>,
        body: BodyId,
        state: StateReference,
    ) -> Result<Option<DMatrix<f64>>, Error> {
        let StateReference::Translational(other) = state else {
            return Ok(None);
        };
        let sign = if other == body {
            1.0
        } else if other == self.exerting() {
            -1.0
        } else {
            return Ok(None);
        };

        let gradient = self.position_gradient(env, body)?;
        let mut block = DMatrix::zeros(3, 6);
        block.fixed_view_mut::<3, 3>(0, 0).copy_from(&(gradient * sign));
        Ok(Some(block))
    }

    fn wrt_parameter(
        &self,
        env: &Environment<'_>,
        body: BodyId,
        parameter: &ParameterId,
    ) -> Result<Option<DMatrix<f64>>, Error> {
        match parameter {
            ParameterId::GravitationalParameter { body: name }
                if name == env.registry().name(self.exerting()) =>
            {
                let r = self.relative_position(env, body)?;
                let column: Vector3<f64> = -r / r.norm().powi(3);
                Ok(Some(DMatrix::from_column_slice(3, 1, column.as_slice())))
            }
            _ => Ok(None),
        }
    }
}
