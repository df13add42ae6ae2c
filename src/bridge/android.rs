//! JNI bridge to the JVM-hosted `HapticlabsPlayer`.
//!
//! Object-call shape: every operation is a named method on one long-lived
//! player instance. Completion is delivered through a `NativeCompletion`
//! helper object (a Kotlin `Function0`) that carries a pointer to a boxed
//! [`CompletionProxy`] and calls back into
//! `Java_io_hapticlabs_hapticlabsplayer_bridge_NativeCompletion_nativeInvoke`
//! at most once.
//!
//! If the player throws after the helper was built, the handle is detached
//! from the helper and the proxy reclaimed before the failure is reported, so
//! a later `invoke()` from the player is a no-op and nothing leaks.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Once;

use jni::objects::{GlobalRef, JClass, JObject, JString, JValue};
use jni::sys::jlong;
use jni::{JNIEnv, JavaVM};
use tracing::{error, info, warn};

use crate::config::AndroidConfig;
use crate::error::BridgeError;
use crate::platform::Platform;

use super::{Completion, CompletionChannel, CompletionProxy, NativeBridge, PatternFormat};

const PLAY_SIG: &str = "(Ljava/lang/String;Lkotlin/jvm/functions/Function0;)V";
const PATH_SIG: &str = "(Ljava/lang/String;)V";

/// Live handle on the JVM haptics player.
pub struct JniHapticsBridge {
    vm: JavaVM,
    player: GlobalRef,
    completion_class: GlobalRef,
}

impl JniHapticsBridge {
    /// Construct the player with the current activity as its context.
    ///
    /// # Errors
    /// - [`BridgeError::ContextNotInitialized`] if no Android context was registered
    /// - [`BridgeError::InitFailed`] if either class cannot be loaded or constructed
    pub fn new(config: &AndroidConfig) -> Result<Self, BridgeError> {
        let ctx = catch_unwind(ndk_context::android_context)
            .map_err(|_| BridgeError::ContextNotInitialized)?;
        if ctx.vm().is_null() || ctx.context().is_null() {
            return Err(BridgeError::ContextNotInitialized);
        }

        // SAFETY: ndk-context only hands out the process JavaVM pointer.
        let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }.map_err(jni_failure)?;

        let (player, completion_class) = {
            let mut env = vm.attach_current_thread().map_err(jni_failure)?;
            // SAFETY: the context is a global reference kept alive by ndk-context.
            let activity = unsafe { JObject::from_raw(ctx.context().cast()) };

            let result = env.with_local_frame(16, |env| -> jni::errors::Result<_> {
                let player_class = load_class(env, &activity, &config.player_class)?;
                let player = env.new_object(
                    &player_class,
                    "(Landroid/content/Context;)V",
                    &[JValue::Object(&activity)],
                )?;
                let completion_class = load_class(env, &activity, &config.completion_class)?;
                Ok((env.new_global_ref(player)?, env.new_global_ref(completion_class)?))
            });

            result.map_err(|err| BridgeError::InitFailed {
                reason: describe(&mut env, err),
            })?
        };

        info!("[Bridge] Android haptics player initialized");

        Ok(Self {
            vm,
            player,
            completion_class,
        })
    }

    /// Run `f` on an attached env inside a local frame, converting Java
    /// exceptions into [`BridgeError::NativeCall`].
    fn with_env<R>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut JNIEnv) -> jni::errors::Result<R>,
    ) -> Result<R, BridgeError> {
        let mut env = self.vm.attach_current_thread().map_err(jni_failure)?;
        env.with_local_frame(8, f).map_err(|err| match err {
            jni::errors::Error::JavaException => {
                BridgeError::native_call(operation, take_exception_message(&mut env))
            }
            other => jni_failure(other),
        })
    }

    fn call_with_path(&self, method: &str, path: &str) -> Result<(), BridgeError> {
        self.with_env(method, |env| {
            let jpath = env.new_string(path)?;
            env.call_method(&self.player, method, PATH_SIG, &[JValue::Object(&jpath)])?;
            Ok(())
        })
    }

    fn completion_object<'local>(
        &self,
        env: &mut JNIEnv<'local>,
        proxy: CompletionProxy,
    ) -> jni::errors::Result<JObject<'local>> {
        let handle: jlong = proxy.into_handle();
        let class: &JClass = self.completion_class.as_obj().into();
        env.new_object(class, "(J)V", &[JValue::Long(handle)])
            .inspect_err(|_| {
                // SAFETY: Java never saw the handle; reclaim it here.
                drop(unsafe { CompletionProxy::from_handle(handle) });
            })
    }

    /// Pull the handle back out of a helper the player rejected.
    ///
    /// Must run with no Java exception pending.
    fn reclaim_completion(env: &mut JNIEnv, callback: &JObject) {
        let detached = env
            .call_method(callback, "detach", "()J", &[])
            .and_then(|value| value.j());
        match detached {
            // SAFETY: `detach` zeroes the helper's handle, so the player can
            // no longer deliver it and this is the only reclaim.
            Ok(handle) => drop(unsafe { CompletionProxy::from_handle(handle) }),
            Err(err) => {
                let _ = env.exception_clear();
                warn!("[Bridge] Could not detach completion handle: {}", err);
            }
        }
    }
}

impl NativeBridge for JniHapticsBridge {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    fn completion_channel(&self) -> CompletionChannel {
        CompletionChannel::Proxy
    }

    fn play(
        &self,
        format: PatternFormat,
        path: &str,
        completion: Completion,
    ) -> Result<(), BridgeError> {
        let method = format.play_method();
        let proxy = match completion {
            Completion::Proxy(proxy) => proxy,
            Completion::Correlated(id) => {
                warn!("[Bridge] Android player received correlated request {}", id);
                return Err(BridgeError::unsupported(method));
            }
        };

        self.with_env(method, |env| {
            let jpath = env.new_string(path)?;
            let callback = self.completion_object(env, proxy)?;
            let called = env.call_method(
                &self.player,
                method,
                PLAY_SIG,
                &[JValue::Object(&jpath), JValue::Object(&callback)],
            );
            match called {
                Ok(_) => Ok(Ok(())),
                Err(jni::errors::Error::JavaException) => {
                    let message = take_exception_message(env);
                    Self::reclaim_completion(env, &callback);
                    Ok(Err(BridgeError::native_call(method, message)))
                }
                Err(other) => {
                    Self::reclaim_completion(env, &callback);
                    Err(other)
                }
            }
        })?
    }

    fn play_built_in(&self, effect_name: &str) -> Result<(), BridgeError> {
        self.call_with_path("playBuiltIn", effect_name)
    }

    fn preload(&self, format: PatternFormat, path: &str) -> Result<(), BridgeError> {
        let method = format
            .preload_method()
            .ok_or_else(|| BridgeError::unsupported("preload"))?;
        self.call_with_path(method, path)
    }

    fn unload(&self, format: PatternFormat, path_or_dir: &str) -> Result<(), BridgeError> {
        let method = format
            .unload_method()
            .ok_or_else(|| BridgeError::unsupported("unload"))?;
        self.call_with_path(method, path_or_dir)
    }

    fn unload_all(&self) -> Result<(), BridgeError> {
        self.with_env("unloadAll", |env| {
            env.call_method(&self.player, "unloadAll", "()V", &[])?;
            Ok(())
        })
    }
}

/// Load an application class through the activity's class loader.
///
/// `FindClass` on a natively attached thread only sees the system loader.
fn load_class<'local>(
    env: &mut JNIEnv<'local>,
    activity: &JObject,
    name: &str,
) -> jni::errors::Result<JClass<'local>> {
    let loader = env
        .call_method(activity, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])?
        .l()?;
    let jname = env.new_string(name)?;
    let class = env
        .call_method(
            &loader,
            "loadClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            &[JValue::Object(&jname)],
        )?
        .l()?;
    Ok(JClass::from(class))
}

fn jni_failure(err: jni::errors::Error) -> BridgeError {
    BridgeError::JniFailure {
        reason: err.to_string(),
    }
}

fn describe(env: &mut JNIEnv, err: jni::errors::Error) -> String {
    match err {
        jni::errors::Error::JavaException => take_exception_message(env),
        other => other.to_string(),
    }
}

/// Clear the pending Java exception and return its `toString()`.
fn take_exception_message(env: &mut JNIEnv) -> String {
    const FALLBACK: &str = "Java exception";

    let throwable = match env.exception_occurred() {
        Ok(throwable) if !throwable.is_null() => throwable,
        _ => return FALLBACK.to_string(),
    };
    let _ = env.exception_clear();

    let text = env
        .call_method(&throwable, "toString", "()Ljava/lang/String;", &[])
        .and_then(|value| value.l());
    let message = match text {
        Ok(obj) => {
            let jstr = JString::from(obj);
            env.get_string(&jstr).map(String::from)
        }
        Err(err) => Err(err),
    };
    // toString itself may have thrown.
    let _ = env.exception_clear();

    message.unwrap_or_else(|_| FALLBACK.to_string())
}

static CONTEXT_INIT: Once = Once::new();

/// `NativeHaptics.nativeInit(context)`: register the application context
/// with ndk-context so the player can be constructed lazily later.
#[no_mangle]
pub extern "system" fn Java_io_hapticlabs_hapticlabsplayer_bridge_NativeHaptics_nativeInit(
    env: JNIEnv,
    _class: JClass,
    context: JObject,
) {
    CONTEXT_INIT.call_once(|| {
        let vm = match env.get_java_vm() {
            Ok(vm) => vm,
            Err(err) => {
                error!("[Bridge] nativeInit could not obtain JavaVM: {}", err);
                return;
            }
        };
        let global = match env.new_global_ref(&context) {
            Ok(global) => global,
            Err(err) => {
                error!("[Bridge] nativeInit could not pin context: {}", err);
                return;
            }
        };

        let context_ptr = global.as_obj().as_raw();
        // ndk-context keeps the raw pointer for the process lifetime.
        std::mem::forget(global);

        // SAFETY: both pointers are valid for the process lifetime and this
        // runs exactly once.
        unsafe {
            ndk_context::initialize_android_context(
                vm.get_java_vm_pointer().cast(),
                context_ptr.cast(),
            );
        }
        info!("[Bridge] Android context registered");
    });
}

/// `NativeCompletion.nativeInvoke(handle)`: fire and free a completion proxy.
///
/// The Kotlin side zeroes its handle before calling, and `detach` zeroes it
/// too, so each handle arrives here or in `reclaim_completion` at most once.
#[no_mangle]
pub extern "system" fn Java_io_hapticlabs_hapticlabsplayer_bridge_NativeCompletion_nativeInvoke(
    _env: JNIEnv,
    _this: JObject,
    handle: jlong,
) {
    // SAFETY: `handle` came from `into_handle` in `completion_object` and is
    // delivered at most once.
    let Some(proxy) = (unsafe { CompletionProxy::from_handle(handle) }) else {
        return;
    };
    if catch_unwind(AssertUnwindSafe(move || proxy.invoke())).is_err() {
        error!("[Bridge] Completion callback panicked");
    }
}
