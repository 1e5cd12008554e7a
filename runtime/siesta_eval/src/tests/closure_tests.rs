//! Closure calling convention and yield/resume continuations.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::helpers::{blk, get_expr, int_expr, op_expr, pred, script, set_var};
use crate::errors::EvalError;
use crate::{Closure, ClosureFunction, Frame, Function, Scalar, ScriptContext, Variable};

/// `$1 = $1 + 1; yield $1; $1 = $1 + 1; return $1`
fn count_twice_body() -> siesta_ir::BlockRef {
    blk(|b| {
        set_var(b, 1, "$1", op_expr(1, "+", &[get_expr(1, "$1"), int_expr(1, 1)]));
        b.yld(2, Some(get_expr(2, "$1")));
        set_var(b, 3, "$1", op_expr(3, "+", &[get_expr(3, "$1"), int_expr(3, 1)]));
        b.ret(4, Some(get_expr(4, "$1")));
    })
}

#[test]
fn positional_arguments_bind_under_dollar_names() {
    let instance = script(siesta_ir::Block::empty());
    let closure = Scalar::object(Closure::new(
        &instance,
        blk(|b| {
            b.ret(1, Some(op_expr(1, "-", &[get_expr(1, "$1"), get_expr(1, "$2")])));
        }),
    ));
    let result = instance.call_closure(&closure, "diff", vec![Scalar::int(9), Scalar::int(3)]);
    assert_eq!(result.map(|s| s.int_value()), Ok(6));
}

#[test]
fn message_binds_as_dollar_zero() {
    let instance = script(siesta_ir::Block::empty());
    let closure = Scalar::object(Closure::new(
        &instance,
        blk(|b| {
            b.ret(1, Some(get_expr(1, "$0")));
        }),
    ));
    let result = instance.call_closure(&closure, "greeting", vec![]);
    assert_eq!(result.map(|s| s.string_value()), Ok("greeting".to_owned()));
}

#[test]
fn completion_without_return_yields_the_empty_scalar() {
    let instance = script(siesta_ir::Block::empty());
    let closure = Scalar::object(Closure::new(
        &instance,
        blk(|b| {
            set_var(b, 1, "$1", int_expr(1, 5));
        }),
    ));
    let result = instance.call_closure(&closure, "", vec![]);
    assert!(result.unwrap().is_empty());
}

mod coroutine {
    use super::*;
    use super::assert_eq;

    #[test]
    fn yield_suspends_and_resume_continues_at_the_sibling_step() {
        let instance = script(siesta_ir::Block::empty());
        let closure = Scalar::object(Closure::new(&instance, count_twice_body()));

        let first = instance.call_closure(&closure, "f", vec![Scalar::int(1)]);
        assert_eq!(first.map(|s| s.int_value()), Ok(2));

        // Local $1 survived the suspension; resume runs past the yield.
        let second = instance.call_closure(&closure, "f", vec![]);
        assert_eq!(second.map(|s| s.int_value()), Ok(3));
    }

    #[test]
    fn resumable_flag_tracks_the_saved_continuation() {
        let instance = script(siesta_ir::Block::empty());
        let closure = Closure::new(&instance, count_twice_body());
        let scalar = Scalar::object(closure);

        let object = scalar.object_value().unwrap();
        let closure = object.downcast_ref::<Closure>().unwrap();
        assert!(!closure.is_resumable());

        instance.call_closure(&scalar, "f", vec![]).unwrap();
        assert!(closure.is_resumable());

        instance.call_closure(&scalar, "f", vec![]).unwrap();
        assert!(!closure.is_resumable());
    }

    #[test]
    fn completed_closure_starts_fresh_on_the_next_call() {
        let instance = script(siesta_ir::Block::empty());
        let closure = Scalar::object(Closure::new(&instance, count_twice_body()));

        assert_eq!(
            instance
                .call_closure(&closure, "f", vec![Scalar::int(10)])
                .map(|s| s.int_value()),
            Ok(11)
        );
        assert_eq!(
            instance.call_closure(&closure, "f", vec![]).map(|s| s.int_value()),
            Ok(12)
        );
        // The continuation was consumed; a new call rebinds from scratch.
        assert_eq!(
            instance
                .call_closure(&closure, "f", vec![Scalar::int(100)])
                .map(|s| s.int_value()),
            Ok(101)
        );
    }

    #[test]
    fn copied_closure_scalars_share_one_continuation() {
        let instance = script(siesta_ir::Block::empty());
        let original = Scalar::object(Closure::new(&instance, count_twice_body()));
        let copy = Scalar::empty();
        copy.set_from(&original);

        assert_eq!(
            instance
                .call_closure(&original, "f", vec![Scalar::int(1)])
                .map(|s| s.int_value()),
            Ok(2)
        );
        // Resuming through the copy picks up the same saved state.
        assert_eq!(
            instance.call_closure(&copy, "f", vec![]).map(|s| s.int_value()),
            Ok(3)
        );
    }

    #[test]
    fn independent_closures_over_one_block_do_not_share_state() {
        let instance = script(siesta_ir::Block::empty());
        let body = count_twice_body();
        let a = Scalar::object(Closure::new(&instance, body.clone()));
        let b = Scalar::object(Closure::new(&instance, body));

        instance.call_closure(&a, "f", vec![Scalar::int(1)]).unwrap();
        let b_first = instance.call_closure(&b, "f", vec![Scalar::int(50)]);
        assert_eq!(b_first.map(|s| s.int_value()), Ok(51));

        let a_resumed = instance.call_closure(&a, "f", vec![]);
        assert_eq!(a_resumed.map(|s| s.int_value()), Ok(3));
    }

    #[test]
    fn yield_inside_a_loop_exits_the_loop_on_resume() {
        // while ($1 < 10) { yield $1 }
        // return 99
        let instance = script(siesta_ir::Block::empty());
        let body = blk(|b| {
            b.goto(
                1,
                pred(1, "<", &[get_expr(1, "$1"), int_expr(1, 10)]),
                blk(|loop_body| {
                    loop_body.yld(2, Some(get_expr(2, "$1")));
                }),
                None,
            );
            b.ret(3, Some(int_expr(3, 99)));
        });
        let closure = Scalar::object(Closure::new(&instance, body));

        let first = instance.call_closure(&closure, "f", vec![Scalar::int(5)]);
        assert_eq!(first.map(|s| s.int_value()), Ok(5));

        // The yield propagated out of the loop; resume continues after it.
        let second = instance.call_closure(&closure, "f", vec![]);
        assert_eq!(second.map(|s| s.int_value()), Ok(99));
    }
}

#[test]
fn closure_displays_its_runtime_id() {
    let instance = script(siesta_ir::Block::empty());
    let closure = Scalar::object(Closure::new(&instance, siesta_ir::Block::empty()));
    let rendered = closure.string_value();
    assert!(
        rendered.starts_with("&closure["),
        "unexpected rendering: {rendered}"
    );
}

#[test]
fn metadata_rides_with_the_closure() {
    let instance = script(siesta_ir::Block::empty());
    let scalar = Scalar::object(Closure::new(&instance, siesta_ir::Block::empty()));
    let object = scalar.object_value().unwrap();
    let closure = object.downcast_ref::<Closure>().unwrap();

    assert_eq!(closure.metadata_get("origin"), None);
    closure.metadata_put("origin", Scalar::string("listener"));
    assert_eq!(
        closure.metadata_get("origin").map(|s| s.string_value()),
        Some("listener".to_owned())
    );
}

#[test]
fn invoking_a_non_closure_scalar_is_an_error() {
    let instance = script(siesta_ir::Block::empty());
    let result = instance.call_closure(&Scalar::int(5), "f", vec![]);
    assert!(matches!(result, Err(EvalError::NotAClosure { .. })));
}

#[test]
fn unloaded_owner_makes_the_closure_inert() {
    let instance = script(siesta_ir::Block::empty());
    let closure = Scalar::object(Closure::new(&instance, count_twice_body()));
    instance.set_unloaded();
    let result = instance.call_closure(&closure, "f", vec![]);
    assert!(matches!(result, Err(EvalError::Unloaded { .. })));
}

#[test]
fn closure_with_explicit_scope_reads_through_the_closure_level() {
    let instance = script(siesta_ir::Block::empty());
    let scope = crate::new_level();
    scope.write().put("$captured", Scalar::int(40));
    let closure = Scalar::object(Closure::with_scope(
        &instance,
        blk(|b| {
            b.ret(1, Some(op_expr(1, "+", &[get_expr(1, "$captured"), int_expr(1, 2)])));
        }),
        scope,
    ));
    let result = instance.call_closure(&closure, "f", vec![]);
    assert_eq!(result.map(|s| s.int_value()), Ok(42));
}

/// Bridge that invokes a closure argument - the callback-delivery path.
struct Apply;

impl Function for Apply {
    fn evaluate(
        &self,
        _name: &str,
        ctx: &mut ScriptContext<'_>,
        args: &mut Frame,
    ) -> crate::EvalResult {
        let argument = args.pop_or_empty();
        let closure = args.pop_or_empty();
        ctx.invoke_closure(&closure, "apply", Frame::from_values([argument]))
    }
}

#[test]
fn bridges_invoke_closures_through_the_context() {
    // set $f = { return $1 + 100 }; $r = &apply($f, 1)
    let instance = script(blk(|b| {
        b.assign(
            1,
            get_expr(1, "$f"),
            blk(|c| {
                c.create_closure(
                    1,
                    blk(|body| {
                        body.ret(1, Some(op_expr(1, "+", &[get_expr(1, "$1"), int_expr(1, 100)])));
                    }),
                );
            }),
        );
        set_var(
            b,
            2,
            "$r",
            super::helpers::call_expr(2, "&apply", &[get_expr(2, "$f"), int_expr(2, 1)]),
        );
    }));
    instance.registry().register_function("&apply", Arc::new(Apply));
    assert!(instance.run().is_ok());
    assert_eq!(super::helpers::global_int(&instance, "$r"), Some(101));
}

/// Binder installing declared subroutines as registry functions, the way a
/// language bridge registers its `sub` keyword.
struct SubBinder;

impl crate::Binder for SubBinder {
    fn bind_function(
        &self,
        ctx: &mut ScriptContext<'_>,
        _keyword: &str,
        name: &str,
        body: &siesta_ir::BlockRef,
    ) -> Result<(), EvalError> {
        let closure = Scalar::object(Closure::new(ctx.instance(), body.clone()));
        let adapter = ClosureFunction::from_scalar(&closure)
            .ok_or_else(|| crate::errors::bridge_error("bind target is not a closure"))?;
        ctx.registry().register_function(name, Arc::new(adapter));
        Ok(())
    }
}

impl crate::FilterBinder for SubBinder {
    fn bind_filtered_function(
        &self,
        ctx: &mut ScriptContext<'_>,
        _keyword: &str,
        name: &str,
        parameter: &Scalar,
        body: &siesta_ir::BlockRef,
    ) -> Result<(), EvalError> {
        let closure = Closure::new(ctx.instance(), body.clone());
        closure.metadata_put("filter", parameter.copy_of());
        let scalar = Scalar::object(closure);
        ctx.variables().put_global(name, scalar);
        Ok(())
    }
}

#[test]
fn bind_declares_a_named_subroutine() {
    // sub &triple { return $1 * 3 }
    // $r = &triple(5)
    let instance = script(blk(|b| {
        b.bind(
            1,
            "sub",
            "&triple",
            blk(|body| {
                body.ret(2, Some(op_expr(2, "*", &[get_expr(2, "$1"), int_expr(2, 3)])));
            }),
        );
        set_var(
            b,
            3,
            "$r",
            super::helpers::call_expr(3, "&triple", &[int_expr(3, 5)]),
        );
    }));
    instance.registry().register_binder("sub", Arc::new(SubBinder));
    assert!(instance.run().is_ok());
    assert_eq!(super::helpers::global_int(&instance, "$r"), Some(15));
}

#[test]
fn bind_filter_evaluates_the_parameter_at_bind_time() {
    // on join "#chan" { ... } - the filter expression runs when the
    // handler is declared, not when it fires.
    let instance = script(blk(|b| {
        b.bind_filter(
            1,
            "on",
            "$join_handler",
            super::helpers::op_expr(1, ".", &[super::helpers::str_expr(1, "#"), super::helpers::str_expr(1, "chan")]),
            blk(|body| {
                body.ret(2, Some(int_expr(2, 1)));
            }),
        );
    }));
    instance
        .registry()
        .register_filter_binder("on", Arc::new(SubBinder));
    assert!(instance.run().is_ok());

    let handler = super::helpers::global(&instance, "$join_handler").unwrap();
    let object = handler.object_value().unwrap();
    let closure = object.downcast_ref::<Closure>().unwrap();
    assert_eq!(
        closure.metadata_get("filter").map(|s| s.string_value()),
        Some("#chan".to_owned())
    );
}

#[test]
fn missing_binder_keywords_warn() {
    let (instance, warnings) = super::helpers::watched(blk(|b| {
        b.bind(1, "sub", "&x", siesta_ir::Block::empty());
        set_var(b, 2, "$after", int_expr(2, 1));
    }));
    assert!(instance.run().is_ok());
    assert_eq!(super::helpers::global_int(&instance, "$after"), Some(1));
    assert_eq!(
        warnings.messages(),
        vec!["undefined environment keyword sub".to_owned()]
    );
}

#[test]
fn closure_function_adapter_exposes_closures_as_named_functions() {
    // sub &double { return $1 * 2 } style binding, done by hand.
    let instance = script(blk(|b| {
        set_var(
            b,
            1,
            "$r",
            super::helpers::call_expr(1, "&double", &[int_expr(1, 21)]),
        );
    }));
    let closure = Scalar::object(Closure::new(
        &instance,
        blk(|body| {
            body.ret(1, Some(op_expr(1, "*", &[get_expr(1, "$1"), int_expr(1, 2)])));
        }),
    ));
    let adapter = ClosureFunction::from_scalar(&closure).unwrap();
    instance.registry().register_function("&double", Arc::new(adapter));

    assert!(instance.run().is_ok());
    assert_eq!(super::helpers::global_int(&instance, "$r"), Some(42));
}
